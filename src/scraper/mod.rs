//! Browser-driven price scraping.
//!
//! This module owns everything that touches a page: the browser session
//! abstraction, navigation with ready-marker waits, candidate extraction and
//! price normalization.
//!
//! # Architecture
//!
//! ```text
//! Target → Navigator (begin, await_ready) → PriceExtractor → Quote
//!                     ↑                          ↑
//!                BrowserSession / Tab      Extract + PriceParser
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use pricetap::scraper::{BrowserSession, ChromeSession, Navigator, PriceExtractor, ScraperConfig};
//!
//! let config = ScraperConfig::default();
//! let session = ChromeSession::launch(&config).await?;
//! let tab = session.open_tab().await?;
//!
//! Navigator::from_config(&config).load(tab.as_ref(), &target.url(), "span.price", None).await?;
//! let quote = PriceExtractor.extract(tab.as_ref(), &target, 1).await?;
//! ```

mod chrome;
mod config;
mod extractor;
mod navigator;
mod price;
mod profile;

#[cfg(test)]
pub(crate) mod mock;

pub use chrome::ChromeSession;
pub use config::ScraperConfig;
pub use extractor::{Extract, NotFoundSignature, PriceExtractor, ScriptExtract, SelectorExtract};
pub use navigator::{NavError, Navigator};
pub use price::PriceParser;
pub use profile::SourceProfile;

use async_trait::async_trait;
use thiserror::Error;

use crate::app::SessionFault;

/// Failure of a single page operation.
///
/// Only [`PageError::Session`] means the browser itself is gone; every other
/// variant is scoped to the tab it happened on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("stale element: {0}")]
    Stale(String),

    #[error("script failed: {0}")]
    Script(String),

    #[error(transparent)]
    Session(#[from] SessionFault),
}

/// A single browser tab.
///
/// Implementations never hand out element handles; every query re-resolves
/// the selector against the live document.
#[async_trait]
pub trait Tab: Send + Sync {
    /// Issue a navigation without waiting for the page to finish loading
    async fn navigate(&self, url: &str) -> Result<(), PageError>;

    async fn has_element(&self, selector: &str) -> Result<bool, PageError>;

    /// Inner text of the first element matching `selector`, if any
    async fn element_text(&self, selector: &str) -> Result<Option<String>, PageError>;

    async fn title(&self) -> Result<String, PageError>;

    async fn body_text(&self) -> Result<String, PageError>;

    /// Evaluate a script expression and return its JSON value
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, PageError>;

    async fn close(self: Box<Self>) -> Result<(), PageError>;
}

/// A browser session with a persistent home tab.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Open a fresh blank tab
    async fn open_tab(&self) -> Result<Box<dyn Tab>, PageError>;

    /// Make the home tab the active context again
    async fn activate_home(&self) -> Result<(), PageError>;
}
