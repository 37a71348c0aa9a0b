use std::time::Duration;

use crate::scraper::{Extract, NotFoundSignature, PriceParser, ScriptExtract, SelectorExtract};

/// How to read one upstream site: its ready marker, where the price lives,
/// how to parse it and what a missing page looks like.
#[derive(Debug)]
pub struct SourceProfile {
    pub ready_selector: String,
    /// Overrides the navigator's default ready timeout
    pub ready_timeout: Option<Duration>,
    pub extract: Box<dyn Extract>,
    pub parser: PriceParser,
    pub not_found: NotFoundSignature,
}

impl SourceProfile {
    pub fn new(ready_selector: impl Into<String>, extract: Box<dyn Extract>) -> Self {
        Self {
            ready_selector: ready_selector.into(),
            ready_timeout: None,
            extract,
            parser: PriceParser::new(),
            not_found: NotFoundSignature::default(),
        }
    }

    pub fn with_selectors(ready_selector: impl Into<String>, selectors: Vec<String>) -> Self {
        Self::new(ready_selector, Box::new(SelectorExtract::new(selectors)))
    }

    pub fn with_script(ready_selector: impl Into<String>, script: impl Into<String>) -> Self {
        Self::new(ready_selector, Box::new(ScriptExtract::new(script)))
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = Some(timeout);
        self
    }

    pub fn with_parser(mut self, parser: PriceParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_not_found(mut self, signature: NotFoundSignature) -> Self {
        self.not_found = signature;
        self
    }
}
