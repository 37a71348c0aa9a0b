use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::{PricetapError, Result, SessionFault};
use crate::scraper::config::ScraperConfig;
use crate::scraper::{BrowserSession, PageError, Tab};

/// Chromium session driven through chromiumoxide, with one long-lived home tab.
pub struct ChromeSession {
    browser: Browser,
    home: Page,
    handler: JoinHandle<()>,
    user_agent: Option<String>,
}

impl ChromeSession {
    /// Launch a browser with the given configuration
    pub async fn launch(config: &ScraperConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer");

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder
            .build()
            .map_err(|e| PricetapError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            PricetapError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // The handler drives the CDP connection; when it ends the session is dead
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
            warn!("Browser handler stopped");
        });

        let home = browser
            .new_page("about:blank")
            .await
            .map_err(|e| PricetapError::Browser(format!("Failed to open home tab: {}", e)))?;

        info!("Browser session started");

        Ok(Self {
            browser,
            home,
            handler,
            user_agent: config.user_agent.clone(),
        })
    }

    /// Close the browser and stop the handler task
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        info!("Browser session closed");
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn open_tab(&self) -> std::result::Result<Box<dyn Tab>, PageError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| classify(e, PageError::Navigation))?;

        if let Some(ref ua) = self.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| classify(e, PageError::Navigation))?;
        }

        Ok(Box::new(ChromeTab { page }))
    }

    async fn activate_home(&self) -> std::result::Result<(), PageError> {
        self.home
            .bring_to_front()
            .await
            .map(|_| ())
            .map_err(|e| classify(e, PageError::Navigation))
    }
}

struct ChromeTab {
    page: Page,
}

impl ChromeTab {
    async fn eval(&self, script: &str) -> std::result::Result<Value, PageError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| classify(e, PageError::Script))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl Tab for ChromeTab {
    async fn navigate(&self, url: &str) -> std::result::Result<(), PageError> {
        let response = self
            .page
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| classify(e, PageError::Navigation))?;

        match response.result.error_text {
            Some(ref error) if !error.is_empty() => Err(PageError::Navigation(error.clone())),
            _ => Ok(()),
        }
    }

    async fn has_element(&self, selector: &str) -> std::result::Result<bool, PageError> {
        let script = format!("document.querySelector({}) !== null", js_string(selector));
        Ok(self.eval(&script).await?.as_bool().unwrap_or(false))
    }

    async fn element_text(&self, selector: &str) -> std::result::Result<Option<String>, PageError> {
        let element = match self.page.find_element(selector).await {
            Ok(element) => element,
            Err(e) => {
                return match classify(e, PageError::Navigation) {
                    PageError::Session(fault) => Err(PageError::Session(fault)),
                    _ => Ok(None),
                }
            }
        };

        // The node was found a moment ago; failing to read it now means it
        // was detached by a re-render.
        element
            .inner_text()
            .await
            .map_err(|e| classify(e, PageError::Stale))
    }

    async fn title(&self) -> std::result::Result<String, PageError> {
        self.page
            .get_title()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| classify(e, PageError::Script))
    }

    async fn body_text(&self) -> std::result::Result<String, PageError> {
        let value = self
            .eval("document.body ? document.body.innerText : ''")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn evaluate(&self, script: &str) -> std::result::Result<Value, PageError> {
        self.eval(script).await
    }

    async fn close(self: Box<Self>) -> std::result::Result<(), PageError> {
        self.page
            .close()
            .await
            .map_err(|e| classify(e, PageError::Navigation))
    }
}

/// Split CDP errors into session faults and page-scoped failures.
fn classify(err: CdpError, page_error: fn(String) -> PageError) -> PageError {
    match err {
        CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
            PageError::Session(SessionFault(err.to_string()))
        }
        other => page_error(other.to_string()),
    }
}

fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
