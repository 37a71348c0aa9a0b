//! Configuration management for pricetap.
//!
//! Configuration is read from `~/.config/pricetap/config.toml` unless a path
//! is given. If the file doesn't exist, a default configuration with
//! comments is created.

pub mod sources;

pub use sources::{MatrixConfig, SourceConfig, AARAV_SCRIPT};

use crate::delivery::telegram::DEFAULT_API_BASE;
use crate::delivery::Destination;
use crate::domain::Target;
use crate::report::DEFAULT_UTC_OFFSET_MINUTES;
use crate::scraper::ScraperConfig;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: ScraperConfig,
    pub retry: RetryConfig,
    pub report: ReportConfig,
    pub delivery: DeliveryConfig,
    pub sources: Vec<SourceConfig>,
    pub matrix: Option<MatrixConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser: ScraperConfig::default(),
            retry: RetryConfig::default(),
            report: ReportConfig::default(),
            delivery: DeliveryConfig::default(),
            sources: sources::default_sources(),
            matrix: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per target before giving up (default: 5)
    pub max_retries: u32,

    /// Pause between retry rounds in seconds (default: 30)
    pub retry_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Offset from UTC for report timestamps, in minutes
    pub utc_offset_minutes: i32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Print every message to stdout
    pub console: bool,

    /// Environment variable holding the bot token
    pub telegram_token_env: String,

    pub chat_ids: Vec<i64>,

    pub api_base: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            console: true,
            telegram_token_env: "TELEGRAM_TOKEN".to_string(),
            chat_ids: Vec::new(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl DeliveryConfig {
    /// Console (if enabled) followed by every chat id when `telegram` is set.
    pub fn destinations(&self, telegram: bool) -> Vec<Destination> {
        let mut out = Vec::new();
        if self.console {
            out.push(Destination::Console);
        }
        if telegram {
            out.extend(self.chat_ids.iter().map(|&id| Destination::Chat(id)));
        }
        out
    }
}

impl Config {
    /// Load configuration from `path`.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/pricetap/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("pricetap").join("config.toml"))
    }

    /// Targets for every `[[sources]]` entry, in file order.
    pub fn source_targets(&self) -> Result<Vec<Target>, ConfigError> {
        self.sources
            .iter()
            .map(|s| s.target(&self.browser))
            .collect()
    }

    /// Targets for the `[matrix]` section, if one is configured.
    pub fn matrix_targets(&self) -> Result<Option<Vec<Target>>, ConfigError> {
        self.matrix
            .as_ref()
            .map(|m| m.targets(&self.browser))
            .transpose()
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let default_config = Self::default_config_content();

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(default_config.as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        format!(
            r##"# pricetap configuration
#
# Every section is optional; missing values use the defaults shown here.

[browser]
# Run browser in headless mode (no visible window)
headless = true

# Chrome/Chromium binary; found on PATH when unset
# chrome_path = "/usr/bin/chromium"

# Seconds to wait for a page's ready marker
ready_timeout_secs = 15

# Milliseconds between ready-marker checks
poll_interval_ms = 250

# Tabs opened at once when fetching many targets
batch_size = 5

# Re-reads allowed when a price element is replaced mid-read
stale_retries = 2

[retry]
# Attempts per source for `pricetap watch`
max_retries = 5

# Seconds between retry rounds
retry_delay_secs = 30

[report]
# Timestamp offset from UTC in minutes (330 = Asia/Kolkata)
utc_offset_minutes = 330

[delivery]
# Print every message to stdout
console = true

# Environment variable holding the Telegram bot token (used with --telegram)
telegram_token_env = "TELEGRAM_TOKEN"

# Telegram chat ids to message
chat_ids = []

[[sources]]
id = "abc-bullion"
label = "ABC Bullion"
icon = "🏆"
url = "https://www.abcbullion.com.au/store/gold/gabgtael375g-abc-bullion-tael-cast-bar"
ready_selector = "div.scope-buy-by p.price-container span.price"
ready_timeout_secs = 10
selectors = ["div.scope-buy-by p.price-container span.price"]

[[sources]]
id = "aarav-bullion"
label = "Aarav Bullion"
icon = "💫"
url = "https://aaravbullion.in/"
ready_selector = "div.swiper-container.s1"
ready_timeout_secs = 15
# Prices are published without a currency symbol
implied_currency = "₹"
script = '''
{aarav_script}
'''

# Trade-in price grid for `pricetap matrix`. {{name}} and {{variant}} are
# replaced with each model and storage tier.
#
# [matrix]
# label = "iPhone trade-in"
# url_template = "https://example.com/sell/{{name}}-{{variant}}"
# ready_selector = "span.price"
# selectors = ["span.price"]
# storages = ["64gb", "128gb", "256gb", "512gb", "1tb"]
"##,
            aarav_script = AARAV_SCRIPT
        )
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.browser.batch_size, 5);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.report.utc_offset_minutes, 330);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].id, "aarav-bullion");
        assert!(config.sources[1]
            .script
            .as_deref()
            .unwrap()
            .contains("return data[0];"));
        assert!(config.matrix.is_none());
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[retry]
max_retries = 3

[delivery]
chat_ids = [7932502148]
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        // Custom values
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.delivery.chat_ids, vec![7932502148]);
        // Defaults
        assert_eq!(config.retry.retry_delay(), Duration::from_secs(30));
        assert_eq!(config.delivery.telegram_token_env, "TELEGRAM_TOKEN");
        assert_eq!(config.sources.len(), 2);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");

        assert!(config.browser.headless);
        assert_eq!(config.delivery.api_base, DEFAULT_API_BASE);
        assert_eq!(config.source_targets().unwrap().len(), 2);
        assert!(config.matrix_targets().unwrap().is_none());
    }

    #[test]
    fn test_matrix_section_fills_defaults() {
        let content = r##"
[matrix]
url_template = "https://trade.example.com/{name}/{variant}"
selectors = ["span.price"]
storages = ["128gb"]
"##;
        let config: Config = toml::from_str(content).unwrap();
        let targets = config.matrix_targets().unwrap().unwrap();

        assert_eq!(targets.len(), 15);
        assert_eq!(targets[0].id.as_str(), "iphone-11/128gb");
    }

    #[test]
    fn test_destinations() {
        let delivery = DeliveryConfig {
            chat_ids: vec![1, 2],
            ..DeliveryConfig::default()
        };
        assert_eq!(delivery.destinations(false), vec![Destination::Console]);
        assert_eq!(
            delivery.destinations(true),
            vec![Destination::Console, Destination::Chat(1), Destination::Chat(2)]
        );
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.sources.len(), 2);

        // Second load parses the file just written
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.sources[0].id, "abc-bullion");
    }

    #[test]
    fn test_load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[retry]\nmax_retries = \"many\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
