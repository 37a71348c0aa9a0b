use std::fmt;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use tracing::debug;

use crate::app::SessionFault;
use crate::domain::{Quote, Target, UnavailableReason};
use crate::scraper::{PageError, Tab};

/// Source of candidate price strings on a ready page.
///
/// Only a session fault escapes; per-page failures yield no candidates.
#[async_trait]
pub trait Extract: Send + Sync + fmt::Debug {
    async fn candidates(&self, tab: &dyn Tab) -> Result<Vec<String>, SessionFault>;
}

/// Reads the inner text of CSS selectors, in priority order.
#[derive(Debug, Clone)]
pub struct SelectorExtract {
    selectors: Vec<String>,
    stale_retries: u32,
}

impl SelectorExtract {
    pub fn new(selectors: Vec<String>) -> Self {
        Self {
            selectors,
            stale_retries: 2,
        }
    }

    pub fn with_stale_retries(mut self, retries: u32) -> Self {
        self.stale_retries = retries;
        self
    }

    /// Read `selector`, re-querying when the element goes stale under us.
    async fn read_fresh(&self, tab: &dyn Tab, selector: &str) -> Result<Option<String>, SessionFault> {
        let mut requeries = 0;
        loop {
            match tab.element_text(selector).await {
                Ok(text) => return Ok(text),
                Err(PageError::Stale(_)) if requeries < self.stale_retries => {
                    requeries += 1;
                    debug!("Element {} went stale, re-querying ({})", selector, requeries);
                }
                Err(PageError::Session(fault)) => return Err(fault),
                Err(e) => {
                    debug!("Could not read {}: {}", selector, e);
                    return Ok(None);
                }
            }
        }
    }
}

#[async_trait]
impl Extract for SelectorExtract {
    async fn candidates(&self, tab: &dyn Tab) -> Result<Vec<String>, SessionFault> {
        let mut out = Vec::new();
        for selector in &self.selectors {
            if let Some(text) = self.read_fresh(tab, selector).await? {
                let text = text.trim();
                if !text.is_empty() {
                    out.push(text.to_string());
                }
            }
        }
        Ok(out)
    }
}

/// Runs an injected script whose body `return`s a string, number or array.
#[derive(Debug, Clone)]
pub struct ScriptExtract {
    body: String,
}

impl ScriptExtract {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// The script body wrapped so a top-level `return` is valid.
    pub fn extraction_script(&self) -> String {
        format!(
            r#"
            (() => {{
                {body}
            }})()
            "#,
            body = self.body
        )
    }
}

#[async_trait]
impl Extract for ScriptExtract {
    async fn candidates(&self, tab: &dyn Tab) -> Result<Vec<String>, SessionFault> {
        match tab.evaluate(&self.extraction_script()).await {
            Ok(value) => Ok(flatten(value)
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()),
            Err(PageError::Session(fault)) => Err(fault),
            Err(e) => {
                debug!("Extraction script failed: {}", e);
                Ok(Vec::new())
            }
        }
    }
}

fn flatten(value: Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s],
        Value::Number(n) => vec![n.to_string()],
        Value::Array(items) => items.into_iter().flat_map(flatten).collect(),
        _ => Vec::new(),
    }
}

// Error-page titles. A bare "404" is not enough: prices and SKUs contain it.
static DEFAULT_TITLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\W*(?:error\s+)?404\b",
        r"\b404\s*[-:|]?\s*(?:page\s+)?not\s+found\b",
        r"\berror\s+404\b",
        r"\bpage\s+not\s+found\b",
        r"^\W*not\s+found\b",
    ]
    .iter()
    .map(|p| case_insensitive(p).expect("not-found title pattern is valid"))
    .collect()
});

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Title patterns and body phrases identifying a "page not found" response.
#[derive(Debug, Clone)]
pub struct NotFoundSignature {
    title_patterns: Vec<Regex>,
    body_markers: Vec<String>,
}

impl Default for NotFoundSignature {
    fn default() -> Self {
        Self {
            title_patterns: DEFAULT_TITLE_PATTERNS.clone(),
            body_markers: vec![
                "404 not found".into(),
                "page you requested could not be found".into(),
            ],
        }
    }
}

impl NotFoundSignature {
    /// Title patterns are case-insensitive regexes; body markers are plain
    /// case-insensitive phrases.
    pub fn new(title_patterns: &[String], body_markers: Vec<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            title_patterns: title_patterns
                .iter()
                .map(|p| case_insensitive(p))
                .collect::<Result<_, _>>()?,
            body_markers: body_markers.into_iter().map(|m| m.to_lowercase()).collect(),
        })
    }

    pub fn matches(&self, title: &str, body: &str) -> bool {
        if self.title_patterns.iter().any(|re| re.is_match(title)) {
            return true;
        }
        let body = body.to_lowercase();
        self.body_markers.iter().any(|m| body.contains(m.as_str()))
    }

    /// Check the live page's title, then its body text.
    pub async fn check(&self, tab: &dyn Tab) -> Result<bool, SessionFault> {
        let title = read_or_empty(tab.title().await)?;
        if self.matches(&title, "") {
            return Ok(true);
        }
        let body = read_or_empty(tab.body_text().await)?;
        Ok(self.matches("", &body))
    }
}

fn read_or_empty(result: Result<String, PageError>) -> Result<String, SessionFault> {
    match result {
        Ok(s) => Ok(s),
        Err(PageError::Session(fault)) => Err(fault),
        Err(_) => Ok(String::new()),
    }
}

/// Turns a ready page into a [`Quote`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceExtractor;

impl PriceExtractor {
    pub async fn extract(
        &self,
        tab: &dyn Tab,
        target: &Target,
        attempt: u32,
    ) -> Result<Quote, SessionFault> {
        let profile = target.profile();

        if profile.not_found.check(tab).await? {
            debug!("{} matched the not-found signature", target.id);
            return Ok(Quote::unavailable(target, UnavailableReason::NotFound, None, attempt));
        }

        let candidates = profile.extract.candidates(tab).await?;
        for text in &candidates {
            if let Some(amount) = profile.parser.parse(text) {
                debug!("{} priced at {} from {:?}", target.id, amount, text);
                return Ok(Quote::available(target, text.clone(), amount, attempt));
            }
        }

        debug!("{} had no parseable price in {:?}", target.id, candidates);
        Ok(Quote::unavailable(
            target,
            UnavailableReason::ExtractionMiss,
            candidates.into_iter().next(),
            attempt,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::domain::Price;
    use crate::scraper::mock::{MockPage, MockSession};
    use crate::scraper::{BrowserSession, PriceParser, SourceProfile};

    const URL: &str = "https://shop.example.com/bar";

    async fn extract(page: MockPage, profile: SourceProfile) -> Result<Quote, SessionFault> {
        let session = MockSession::new().with_page(URL, page);
        let tab = session.open_tab().await.unwrap();
        tab.navigate(URL).await.unwrap();
        let target = Target::single("bar", "Bar", URL, Arc::new(profile));
        PriceExtractor.extract(tab.as_ref(), &target, 1).await
    }

    fn selector_profile() -> SourceProfile {
        SourceProfile::with_selectors("span.price", vec!["span.sale".into(), "span.price".into()])
    }

    #[tokio::test]
    async fn test_selector_price() {
        let page = MockPage::new().with_element("span.price", "AU$1,234.56 approx");
        let quote = extract(page, selector_profile()).await.unwrap();

        let amount = quote.price.amount().unwrap();
        assert_eq!(amount.value, 1234.56);
        assert_eq!(quote.raw_text.as_deref(), Some("AU$1,234.56 approx"));
        assert_eq!(quote.attempt, 1);
    }

    #[tokio::test]
    async fn test_selector_priority_order() {
        let page = MockPage::new()
            .with_element("span.sale", "$90.00")
            .with_element("span.price", "$100.00");
        let quote = extract(page, selector_profile()).await.unwrap();
        assert_eq!(quote.price.amount().unwrap().value, 90.0);
    }

    #[tokio::test]
    async fn test_missing_currency_is_extraction_miss() {
        let page = MockPage::new().with_element("span.price", "1,234.56");
        let quote = extract(page, selector_profile()).await.unwrap();

        assert_eq!(quote.reason(), Some(UnavailableReason::ExtractionMiss));
        assert_eq!(quote.raw_text.as_deref(), Some("1,234.56"));
    }

    #[tokio::test]
    async fn test_not_found_page_skips_parsing() {
        // Price element present, but the page is a 404: never parsed
        let page = MockPage::not_found().with_element("span.price", "$10.00");
        let quote = extract(page, selector_profile()).await.unwrap();

        assert_eq!(quote.price, Price::Unavailable(UnavailableReason::NotFound));
        assert!(quote.raw_text.is_none());
    }

    #[tokio::test]
    async fn test_not_found_in_body() {
        let page = MockPage::new()
            .with_title("Gold Bar")
            .with_body("Sorry, 404 Not Found");
        let quote = extract(page, selector_profile()).await.unwrap();
        assert_eq!(quote.reason(), Some(UnavailableReason::NotFound));
    }

    #[tokio::test]
    async fn test_stale_element_is_requeried() {
        let page = MockPage::new()
            .with_element("span.price", "$55.00")
            .with_stale_reads(2);
        let profile = SourceProfile::with_selectors("span.price", vec!["span.price".into()]);
        let quote = extract(page, profile).await.unwrap();
        assert_eq!(quote.price.amount().unwrap().value, 55.0);
    }

    #[tokio::test]
    async fn test_persistently_stale_element_is_a_miss() {
        let page = MockPage::new()
            .with_element("span.price", "$55.00")
            .with_stale_reads(10);
        let profile = SourceProfile::with_selectors("span.price", vec!["span.price".into()]);
        let quote = extract(page, profile).await.unwrap();
        assert_eq!(quote.reason(), Some(UnavailableReason::ExtractionMiss));
    }

    #[tokio::test]
    async fn test_script_with_implied_currency() {
        let page = MockPage::new().with_script_result(json!("72,500"));
        let profile = SourceProfile::with_script("div.swiper-container.s1", "return '72,500';")
            .with_parser(PriceParser::with_implied_currency("\u{20B9}"));
        let quote = extract(page, profile).await.unwrap();

        let amount = quote.price.amount().unwrap();
        assert_eq!(amount.value, 72500.0);
        assert_eq!(amount.currency, "\u{20B9}");
    }

    #[tokio::test]
    async fn test_script_array_and_null_results() {
        let page = MockPage::new().with_script_result(json!(["", "n/a", "$12.00"]));
        let profile = SourceProfile::with_script("body", "return [];");
        let quote = extract(page, profile).await.unwrap();
        assert_eq!(quote.price.amount().unwrap().value, 12.0);

        let page = MockPage::new().with_script_result(Value::Null);
        let profile = SourceProfile::with_script("body", "return null;");
        let quote = extract(page, profile).await.unwrap();
        assert_eq!(quote.reason(), Some(UnavailableReason::ExtractionMiss));
    }

    #[test]
    fn test_extraction_script_wraps_body() {
        let script = ScriptExtract::new("return data[0];").extraction_script();
        assert!(script.contains("(() => {"));
        assert!(script.contains("return data[0];"));
        assert!(script.trim_end().ends_with("})()"));
    }

    #[test]
    fn test_not_found_signature_is_case_insensitive() {
        let sig = NotFoundSignature::default();
        assert!(sig.matches("Page Not Found | Shop", ""));
        assert!(sig.matches("404 Not Found", ""));
        assert!(sig.matches("Error 404 - Trade", ""));
        assert!(sig.matches("", "ERROR: 404 NOT FOUND"));
        assert!(!sig.matches("ABC Bullion Tael Cast Bar", "Add to cart"));
    }

    #[test]
    fn test_titles_containing_404_are_not_error_pages() {
        let sig = NotFoundSignature::default();
        assert!(!sig.matches("Sell iPhone 12 128GB for $404 | Trade", ""));
        assert!(!sig.matches("Gold bar 1,404g", ""));
        assert!(!sig.matches("SKU GB404-T", ""));
    }

    #[tokio::test]
    async fn test_priced_title_with_404_is_parsed() {
        let page = MockPage::new()
            .with_title("Sell iPhone 12 128GB for $404 | Trade")
            .with_element("span.price", "$404.00");
        let quote = extract(page, selector_profile()).await.unwrap();
        assert_eq!(quote.price.amount().unwrap().value, 404.0);
    }

    #[test]
    fn test_custom_signature_patterns() {
        let sig = NotFoundSignature::new(&["^gone$".to_string()], vec!["Sold Out".into()]).unwrap();
        assert!(sig.matches("GONE", ""));
        assert!(sig.matches("", "this item is sold out"));
        assert!(!sig.matches("404 Not Found", ""));

        assert!(NotFoundSignature::new(&["(".to_string()], Vec::new()).is_err());
    }
}
