pub mod aggregator;
pub mod retry;

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::warn;

use crate::app::SessionFault;
use crate::domain::{Quote, Target};
use crate::scraper::BrowserSession;

pub use aggregator::{Aggregator, RunReport};
pub use retry::{RetryController, RetryOutcome, RetryPolicy, RetryState, RetryStatus};

/// Produces one quote per call; each call is one attempt.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch(&self, target: &Target, attempt: u32) -> Result<Quote, SessionFault>;
}

/// Single-tab fetches against a live browser session.
pub struct SessionQuoteSource<'a> {
    session: &'a dyn BrowserSession,
    aggregator: &'a Aggregator,
}

impl<'a> SessionQuoteSource<'a> {
    pub fn new(session: &'a dyn BrowserSession, aggregator: &'a Aggregator) -> Self {
        Self {
            session,
            aggregator,
        }
    }
}

#[async_trait]
impl QuoteSource for SessionQuoteSource<'_> {
    async fn fetch(&self, target: &Target, attempt: u32) -> Result<Quote, SessionFault> {
        self.aggregator.fetch_one(self.session, target, attempt).await
    }
}

/// First occurrence of each target id, in input order.
pub(crate) fn unique_targets(targets: &[Target]) -> Vec<&Target> {
    let mut seen = HashSet::new();
    targets
        .iter()
        .filter(|t| {
            let fresh = seen.insert(&t.id);
            if !fresh {
                warn!("Duplicate target {} ignored", t.id);
            }
            fresh
        })
        .collect()
}
