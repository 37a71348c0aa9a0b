use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::app::SessionFault;
use crate::scraper::{PageError, ScraperConfig, Tab};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    #[error("ready marker `{selector}` did not appear within {waited:?}")]
    Timeout { selector: String, waited: Duration },

    #[error("navigation failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Session(#[from] SessionFault),
}

impl From<PageError> for NavError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::Session(fault) => NavError::Session(fault),
            other => NavError::Failed(other.to_string()),
        }
    }
}

/// Drives a tab to a URL and waits for a ready marker.
#[derive(Debug, Clone)]
pub struct Navigator {
    ready_timeout: Duration,
    poll_interval: Duration,
}

impl Navigator {
    pub fn new(ready_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            ready_timeout,
            poll_interval,
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(config.ready_timeout(), config.poll_interval())
    }

    /// Validate `url` and issue the navigation. Does not wait for content.
    pub async fn begin(&self, tab: &dyn Tab, url: &str) -> Result<(), NavError> {
        Url::parse(url).map_err(|e| NavError::Failed(format!("invalid URL {}: {}", url, e)))?;
        tab.navigate(url).await?;
        Ok(())
    }

    /// Poll for `selector` until it appears or the timeout elapses.
    ///
    /// `timeout` overrides the navigator default for this wait.
    pub async fn await_ready(
        &self,
        tab: &dyn Tab,
        selector: &str,
        timeout: Option<Duration>,
    ) -> Result<(), NavError> {
        let waited = timeout.unwrap_or(self.ready_timeout);

        let poll = async {
            loop {
                match tab.has_element(selector).await {
                    Ok(true) => return Ok(()),
                    Ok(false) => {}
                    Err(PageError::Session(fault)) => return Err(NavError::Session(fault)),
                    // Documents being replaced mid-navigation reject scripts
                    Err(e) => debug!("Ready check for {} failed: {}", selector, e),
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        match tokio::time::timeout(waited, poll).await {
            Ok(result) => result,
            Err(_) => Err(NavError::Timeout {
                selector: selector.to_string(),
                waited,
            }),
        }
    }

    pub async fn load(
        &self,
        tab: &dyn Tab,
        url: &str,
        selector: &str,
        timeout: Option<Duration>,
    ) -> Result<(), NavError> {
        self.begin(tab, url).await?;
        self.await_ready(tab, selector, timeout).await
    }
}
