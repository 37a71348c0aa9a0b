//! In-memory browser session for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::app::SessionFault;
use crate::scraper::{BrowserSession, PageError, Tab};

#[derive(Debug, Clone, Default)]
pub struct MockPage {
    title: String,
    body: String,
    elements: HashMap<String, String>,
    script_result: Option<Value>,
    ready_after_polls: u32,
    stale_reads: u32,
    navigation_error: Option<String>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn not_found() -> Self {
        Self::new()
            .with_title("404 Not Found")
            .with_body("The page you requested could not be found")
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn with_element(mut self, selector: &str, text: &str) -> Self {
        self.elements.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn with_script_result(mut self, value: Value) -> Self {
        self.script_result = Some(value);
        self
    }

    /// Elements only appear after this many presence checks.
    pub fn ready_after_polls(mut self, polls: u32) -> Self {
        self.ready_after_polls = polls;
        self
    }

    /// The first `reads` text reads on a loaded tab report a stale element.
    pub fn with_stale_reads(mut self, reads: u32) -> Self {
        self.stale_reads = reads;
        self
    }

    pub fn with_navigation_error(mut self, error: &str) -> Self {
        self.navigation_error = Some(error.to_string());
        self
    }
}

#[derive(Debug, Default)]
struct SessionState {
    pages: HashMap<String, MockPage>,
    navigations: Vec<String>,
    open_tabs: usize,
    max_open_tabs: usize,
    home_active: bool,
    home_activations: usize,
    fail_after_navigations: Option<usize>,
    dead: bool,
}

impl SessionState {
    fn check_alive(&self) -> Result<(), PageError> {
        if self.dead {
            Err(PageError::Session(SessionFault("mock browser crashed".into())))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockSession {
    state: Arc<Mutex<SessionState>>,
}

impl MockSession {
    pub fn new() -> Self {
        let state = SessionState {
            home_active: true,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_page(self, url: &str, page: MockPage) -> Self {
        self.lock().pages.insert(url.to_string(), page);
        self
    }

    /// Let `n` navigations succeed, then crash the browser.
    pub fn fail_after_navigations(self, n: usize) -> Self {
        self.lock().fail_after_navigations = Some(n);
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    pub fn open_tabs(&self) -> usize {
        self.lock().open_tabs
    }

    pub fn max_open_tabs(&self) -> usize {
        self.lock().max_open_tabs
    }

    pub fn home_active(&self) -> bool {
        self.lock().home_active
    }

    pub fn home_activations(&self) -> usize {
        self.lock().home_activations
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn open_tab(&self) -> Result<Box<dyn Tab>, PageError> {
        let mut state = self.lock();
        state.check_alive()?;
        state.open_tabs += 1;
        state.max_open_tabs = state.max_open_tabs.max(state.open_tabs);
        state.home_active = false;
        Ok(Box::new(MockTab {
            state: self.state.clone(),
            loaded: Mutex::new(None),
        }))
    }

    async fn activate_home(&self) -> Result<(), PageError> {
        let mut state = self.lock();
        state.check_alive()?;
        state.home_active = true;
        state.home_activations += 1;
        Ok(())
    }
}

#[derive(Debug)]
struct LoadedPage {
    page: MockPage,
    polls: u32,
    stale_left: u32,
}

struct MockTab {
    state: Arc<Mutex<SessionState>>,
    loaded: Mutex<Option<LoadedPage>>,
}

impl MockTab {
    fn alive(&self) -> Result<(), PageError> {
        self.state.lock().unwrap().check_alive()
    }

    fn with_page<T>(&self, f: impl FnOnce(&mut LoadedPage) -> T) -> Result<Option<T>, PageError> {
        self.alive()?;
        let mut loaded = self.loaded.lock().unwrap();
        Ok(loaded.as_mut().map(f))
    }
}

#[async_trait]
impl Tab for MockTab {
    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        let page = {
            let mut state = self.state.lock().unwrap();
            state.check_alive()?;
            if let Some(limit) = state.fail_after_navigations {
                if state.navigations.len() >= limit {
                    state.dead = true;
                    return Err(PageError::Session(SessionFault("mock browser crashed".into())));
                }
            }
            state.navigations.push(url.to_string());
            state
                .pages
                .get(url)
                .cloned()
                .unwrap_or_else(MockPage::not_found)
        };

        if let Some(err) = &page.navigation_error {
            return Err(PageError::Navigation(err.clone()));
        }

        let stale_left = page.stale_reads;
        *self.loaded.lock().unwrap() = Some(LoadedPage {
            page,
            polls: 0,
            stale_left,
        });
        Ok(())
    }

    async fn has_element(&self, selector: &str) -> Result<bool, PageError> {
        let found = self.with_page(|p| {
            p.polls += 1;
            p.polls > p.page.ready_after_polls && p.page.elements.contains_key(selector)
        })?;
        Ok(found.unwrap_or(false))
    }

    async fn element_text(&self, selector: &str) -> Result<Option<String>, PageError> {
        let read = self.with_page(|p| {
            if p.stale_left > 0 {
                p.stale_left -= 1;
                return Err(PageError::Stale(selector.to_string()));
            }
            Ok(p.page.elements.get(selector).cloned())
        })?;
        read.unwrap_or(Ok(None))
    }

    async fn title(&self) -> Result<String, PageError> {
        Ok(self.with_page(|p| p.page.title.clone())?.unwrap_or_default())
    }

    async fn body_text(&self) -> Result<String, PageError> {
        Ok(self.with_page(|p| p.page.body.clone())?.unwrap_or_default())
    }

    async fn evaluate(&self, _script: &str) -> Result<Value, PageError> {
        let value = self.with_page(|p| p.page.script_result.clone())?;
        Ok(value.flatten().unwrap_or(Value::Null))
    }

    async fn close(self: Box<Self>) -> Result<(), PageError> {
        let mut state = self.state.lock().unwrap();
        state.check_alive()?;
        state.open_tabs -= 1;
        Ok(())
    }
}
