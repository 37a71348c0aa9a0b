//! # pricetap
//!
//! Scrapes prices from dynamically rendered web pages with a headless
//! browser and relays them as text messages.
//!
//! ## Architecture
//!
//! ```text
//! BrowserSession → Navigator → PriceExtractor → Aggregator / RetryController → ReportFormatter → Notifier
//! ```
//!
//! - [`scraper`]: Chromium session, page readiness and price extraction
//! - [`fetcher`]: batched aggregation over many targets and bounded retries
//! - [`report`]: message text
//! - [`delivery`]: console and Telegram sinks
//!
//! ## Quick Start
//!
//! ```bash
//! # One pass over the configured bullion sources
//! pricetap quote
//!
//! # Keep retrying until every source yields a price, notifying Telegram
//! TELEGRAM_TOKEN=... pricetap --telegram watch
//!
//! # Model x storage trade-in grid from the [matrix] section
//! pricetap matrix
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together configuration,
/// the aggregator, the report formatter and the notifier.
pub mod app;

/// Command-line interface using clap.
///
/// - `quote` - Fetch every source once
/// - `watch` - Retry sources until priced or out of attempts
/// - `matrix` - Fetch the model x storage grid
/// - `targets` - List configured targets
/// - `config-path` - Print the config file location
pub mod cli;

/// Configuration loaded from `~/.config/pricetap/config.toml`.
pub mod config;

/// Message delivery.
///
/// - [`Deliver`](delivery::Deliver): Async trait for sending text to a destination
/// - [`Notifier`](delivery::Notifier): Broadcast to every configured destination
pub mod delivery;

/// Core domain models.
///
/// - [`Target`](domain::Target): One priced item/variant and how to read it
/// - [`Quote`](domain::Quote): A single extraction outcome
/// - [`ResultTable`](domain::ResultTable): One quote per target for a run
pub mod domain;

/// Fetching across many targets.
///
/// - [`Aggregator`](fetcher::Aggregator): Batched tabs, one quote per target
/// - [`RetryController`](fetcher::RetryController): Bounded attempts with partial updates
pub mod fetcher;

/// Text rendering of price updates, retry reports and price grids.
pub mod report;

/// Headless browser scraping.
///
/// - [`ChromeSession`](scraper::ChromeSession): chromiumoxide-backed session
/// - [`Navigator`](scraper::Navigator): Load a page and wait for its ready marker
/// - [`PriceExtractor`](scraper::PriceExtractor): Turn a ready page into a quote
pub mod scraper;
