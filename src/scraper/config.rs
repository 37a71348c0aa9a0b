use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the browser session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Explicit Chrome/Chromium binary; detected from PATH when unset
    pub chrome_path: Option<PathBuf>,

    /// Default wait for a page's ready marker in seconds (default: 15)
    pub ready_timeout_secs: u64,

    /// Interval between ready-marker checks in milliseconds (default: 250)
    pub poll_interval_ms: u64,

    /// Tabs opened per batch when aggregating many targets (default: 5)
    pub batch_size: usize,

    /// Re-queries allowed when an element goes stale mid-read (default: 2)
    pub stale_retries: u32,

    /// User agent string to use
    pub user_agent: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            ready_timeout_secs: 15,
            poll_interval_ms: 250,
            batch_size: 5,
            stale_retries: 2,
            user_agent: Some(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
        }
    }
}

impl ScraperConfig {
    /// Get the ready-marker timeout as a Duration
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Batch size, never below one tab
    pub fn batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}
