use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::config::ConfigError;
use crate::domain::{matrix_targets, Target};
use crate::scraper::{
    Extract, NotFoundSignature, PriceParser, ScraperConfig, ScriptExtract, SelectorExtract,
    SourceProfile,
};

/// Trending-table script for Aarav Bullion; the first row is the spot price.
pub const AARAV_SCRIPT: &str = r#"const data = [];
const slides = document.querySelectorAll("div.swiper-slideTrending");
slides.forEach(slide => {
    const table = slide.querySelector("table.Trending_Table_Root");
    if (table) {
        table.querySelectorAll("table.second_table").forEach(second_table => {
            const rows = second_table.querySelectorAll("tr[style='text-align: center;']");
            rows.forEach(row => {
                const label_td = row.querySelector("td.paddingg.second_label");
                const price_td = row.querySelector("td.paddingg:nth-child(2)");
                if (label_td && price_td) {
                    const span = price_td.querySelector("span");
                    data.push(span ? span.innerText.trim() : "");
                }
            });
        });
    }
});
return data[0];"#;

/// One single-page price source (`[[sources]]`).
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub url: String,
    #[serde(default = "default_ready_selector")]
    pub ready_selector: String,
    /// Overrides `[browser] ready_timeout_secs` for this source
    #[serde(default)]
    pub ready_timeout_secs: Option<u64>,
    /// CSS selectors holding the price, tried in order
    #[serde(default)]
    pub selectors: Vec<String>,
    /// Script body returning the price text; takes precedence over selectors
    #[serde(default)]
    pub script: Option<String>,
    /// Currency for sources that publish bare numbers
    #[serde(default)]
    pub implied_currency: Option<String>,
    /// Case-insensitive regexes matched against the page title
    #[serde(default)]
    pub not_found_titles: Vec<String>,
    #[serde(default)]
    pub not_found_bodies: Vec<String>,
}

fn default_ready_selector() -> String {
    "body".to_string()
}

impl SourceConfig {
    pub fn target(&self, browser: &ScraperConfig) -> Result<Target, ConfigError> {
        let extract = extractor(
            &format!("source {}", self.id),
            &self.selectors,
            self.script.as_deref(),
            browser,
        )?;
        let mut profile = profile(
            &self.ready_selector,
            self.ready_timeout_secs,
            extract,
            self.implied_currency.as_deref(),
        );
        if !self.not_found_titles.is_empty() || !self.not_found_bodies.is_empty() {
            let signature =
                NotFoundSignature::new(&self.not_found_titles, self.not_found_bodies.clone())
                    .map_err(|e| {
                        ConfigError::Invalid(format!(
                            "source {} has a bad not_found_titles pattern: {}",
                            self.id, e
                        ))
                    })?;
            profile = profile.with_not_found(signature);
        }

        let target = Target::single(&self.id, &self.label, &self.url, Arc::new(profile));
        Ok(match &self.icon {
            Some(icon) => target.with_icon(icon),
            None => target,
        })
    }
}

pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            id: "abc-bullion".into(),
            label: "ABC Bullion".into(),
            icon: Some("🏆".into()),
            url: "https://www.abcbullion.com.au/store/gold/gabgtael375g-abc-bullion-tael-cast-bar"
                .into(),
            ready_selector: "div.scope-buy-by p.price-container span.price".into(),
            ready_timeout_secs: Some(10),
            selectors: vec!["div.scope-buy-by p.price-container span.price".into()],
            script: None,
            implied_currency: None,
            not_found_titles: Vec::new(),
            not_found_bodies: Vec::new(),
        },
        SourceConfig {
            id: "aarav-bullion".into(),
            label: "Aarav Bullion".into(),
            icon: Some("💫".into()),
            url: "https://aaravbullion.in/".into(),
            ready_selector: "div.swiper-container.s1".into(),
            ready_timeout_secs: Some(15),
            selectors: Vec::new(),
            script: Some(AARAV_SCRIPT.into()),
            implied_currency: Some("₹".into()),
            not_found_titles: Vec::new(),
            not_found_bodies: Vec::new(),
        },
    ]
}

/// Name × variant grid sharing one URL template (`[matrix]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    pub label: String,
    /// URL with `{name}` and `{variant}` placeholders
    pub url_template: String,
    pub models: Vec<String>,
    pub storages: Vec<String>,
    pub ready_selector: String,
    pub ready_timeout_secs: Option<u64>,
    pub selectors: Vec<String>,
    pub script: Option<String>,
    pub implied_currency: Option<String>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            label: "iPhone trade-in".to_string(),
            url_template: String::new(),
            models: [
                "iphone-11",
                "iphone-11-pro",
                "iphone-11-pro-max",
                "iphone-12",
                "iphone-12-mini",
                "iphone-12-pro",
                "iphone-12-pro-max",
                "iphone-13",
                "iphone-13-mini",
                "iphone-13-pro",
                "iphone-13-pro-max",
                "iphone-14",
                "iphone-14-plus",
                "iphone-14-pro",
                "iphone-14-pro-max",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            storages: ["64gb", "128gb", "256gb", "512gb", "1tb"]
                .into_iter()
                .map(String::from)
                .collect(),
            ready_selector: default_ready_selector(),
            ready_timeout_secs: None,
            selectors: Vec::new(),
            script: None,
            implied_currency: None,
        }
    }
}

impl MatrixConfig {
    pub fn targets(&self, browser: &ScraperConfig) -> Result<Vec<Target>, ConfigError> {
        if self.url_template.trim().is_empty() {
            return Err(ConfigError::Invalid("matrix.url_template is empty".into()));
        }
        let extract = extractor("matrix", &self.selectors, self.script.as_deref(), browser)?;
        let profile = profile(
            &self.ready_selector,
            self.ready_timeout_secs,
            extract,
            self.implied_currency.as_deref(),
        );
        Ok(matrix_targets(
            &self.models,
            &self.storages,
            &self.url_template,
            Arc::new(profile),
        ))
    }
}

fn extractor(
    what: &str,
    selectors: &[String],
    script: Option<&str>,
    browser: &ScraperConfig,
) -> Result<Box<dyn Extract>, ConfigError> {
    match script {
        Some(body) if !body.trim().is_empty() => Ok(Box::new(ScriptExtract::new(body))),
        _ if !selectors.is_empty() => Ok(Box::new(
            SelectorExtract::new(selectors.to_vec()).with_stale_retries(browser.stale_retries),
        )),
        _ => Err(ConfigError::Invalid(format!(
            "{} needs either selectors or a script",
            what
        ))),
    }
}

fn profile(
    ready_selector: &str,
    ready_timeout_secs: Option<u64>,
    extract: Box<dyn Extract>,
    implied_currency: Option<&str>,
) -> SourceProfile {
    let mut profile = SourceProfile::new(ready_selector, extract);
    if let Some(secs) = ready_timeout_secs {
        profile = profile.with_ready_timeout(Duration::from_secs(secs));
    }
    if let Some(currency) = implied_currency {
        profile = profile.with_parser(PriceParser::with_implied_currency(currency));
    }
    profile
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sources_build_targets() {
        let browser = ScraperConfig::default();
        let targets: Vec<Target> = default_sources()
            .iter()
            .map(|s| s.target(&browser).unwrap())
            .collect();

        assert_eq!(targets[0].heading(), "🏆 ABC Bullion");
        assert_eq!(
            targets[0].profile().ready_timeout,
            Some(Duration::from_secs(10))
        );
        assert_eq!(targets[1].url(), "https://aaravbullion.in/");
        assert_eq!(targets[1].profile().parser.implied_currency(), Some("₹"));
    }

    #[test]
    fn test_source_without_selectors_or_script_is_invalid() {
        let mut source = default_sources().remove(0);
        source.selectors.clear();
        let err = source.target(&ScraperConfig::default()).unwrap_err();
        assert!(err.to_string().contains("abc-bullion"));
    }

    #[test]
    fn test_matrix_requires_url_template() {
        let matrix = MatrixConfig {
            selectors: vec!["span.price".into()],
            ..MatrixConfig::default()
        };
        assert!(matrix.targets(&ScraperConfig::default()).is_err());
    }

    #[test]
    fn test_default_matrix_is_fifteen_by_five() {
        let matrix = MatrixConfig {
            url_template: "https://trade.example.com/{name}/{variant}".into(),
            selectors: vec!["span.price".into()],
            ..MatrixConfig::default()
        };
        let targets = matrix.targets(&ScraperConfig::default()).unwrap();
        assert_eq!(targets.len(), 75);
        assert_eq!(
            targets[74].url(),
            "https://trade.example.com/iphone-14-pro-max/1tb"
        );
    }
}
