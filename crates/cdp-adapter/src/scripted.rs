//! In-memory [`BrowserDriver`] that plays back a small scripted site.
//!
//! Pages are keyed by URL and hold elements keyed by their exact selector string. Waiting
//! operations resolve immediately: an element that is absent or hidden now never appears.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::driver::{BrowserDriver, NewTab, MAIN_TAB};
use crate::error::{AdapterError, AdapterErrorKind};

const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nscripted";

/// What happens when an element is clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    /// The main tab navigates to the URL.
    Navigate(String),
    /// A new tab opens on the URL.
    OpenTab(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedElement {
    pub visible: bool,
    pub on_click: Option<ClickEffect>,
}

impl ScriptedElement {
    pub fn visible() -> Self {
        Self {
            visible: true,
            on_click: None,
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            on_click: None,
        }
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.on_click = Some(effect);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedPage {
    pub title: String,
    pub elements: HashMap<String, ScriptedElement>,
}

impl ScriptedPage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elements: HashMap::new(),
        }
    }

    pub fn with_element(mut self, selector: impl Into<String>, element: ScriptedElement) -> Self {
        self.elements.insert(selector.into(), element);
        self
    }
}

#[derive(Debug, Clone)]
struct NavFailure {
    url: String,
    remaining_successes: usize,
    error: AdapterError,
}

#[derive(Debug, Default)]
struct State {
    pages: HashMap<String, ScriptedPage>,
    main_url: String,
    tabs: Vec<NewTab>,
    opened_tabs: usize,
    nav_failures: Vec<NavFailure>,
    evaluation_results: Vec<(String, Value)>,
    connected: bool,
    navigations: Vec<String>,
    clicks: Vec<String>,
    fills: Vec<(String, String)>,
    evaluations: Vec<String>,
    clears: usize,
    shut_down: bool,
}

impl State {
    fn ensure_connected(&self) -> Result<(), AdapterError> {
        if self.connected {
            Ok(())
        } else {
            Err(AdapterError::unavailable("scripted browser disconnected"))
        }
    }

    fn element(&self, selector: &str) -> Option<&ScriptedElement> {
        self.pages
            .get(&self.main_url)
            .and_then(|page| page.elements.get(selector))
    }

    fn open_tab(&mut self, url: String) -> NewTab {
        self.opened_tabs += 1;
        let tab = NewTab {
            id: format!("tab-{}", self.opened_tabs),
            url,
        };
        self.tabs.push(tab.clone());
        tab
    }
}

/// Scripted stand-in for a real browser.
#[derive(Debug)]
pub struct ScriptedBrowser {
    state: Mutex<State>,
}

impl Default for ScriptedBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                main_url: "about:blank".to_string(),
                connected: true,
                ..State::default()
            }),
        }
    }

    pub fn with_page(mut self, url: impl Into<String>, page: ScriptedPage) -> Self {
        self.state.get_mut().pages.insert(url.into(), page);
        self
    }

    /// Evaluations whose expression contains `needle` resolve to `value`; others resolve to null.
    pub fn with_evaluation_result(mut self, needle: impl Into<String>, value: Value) -> Self {
        self.state
            .get_mut()
            .evaluation_results
            .push((needle.into(), value));
        self
    }

    /// Every navigation to `url` fails with `error`.
    pub fn fail_navigation(self, url: impl Into<String>, error: AdapterError) -> Self {
        self.fail_navigation_after(url, 0, error)
    }

    /// Navigations to `url` succeed `successes` times, then fail with `error`.
    pub fn fail_navigation_after(
        mut self,
        url: impl Into<String>,
        successes: usize,
        error: AdapterError,
    ) -> Self {
        self.state.get_mut().nav_failures.push(NavFailure {
            url: url.into(),
            remaining_successes: successes,
            error,
        });
        self
    }

    /// Simulates the browser process going away; every later call reports session loss.
    pub async fn disconnect(&self) {
        self.state.lock().await.connected = false;
    }

    pub async fn navigations(&self) -> Vec<String> {
        self.state.lock().await.navigations.clone()
    }

    pub async fn clicks(&self) -> Vec<String> {
        self.state.lock().await.clicks.clone()
    }

    pub async fn fills(&self) -> Vec<(String, String)> {
        self.state.lock().await.fills.clone()
    }

    pub async fn evaluations(&self) -> Vec<String> {
        self.state.lock().await.evaluations.clone()
    }

    pub async fn clear_count(&self) -> usize {
        self.state.lock().await.clears
    }

    pub async fn open_tab_count(&self) -> usize {
        self.state.lock().await.tabs.len()
    }

    pub async fn is_shut_down(&self) -> bool {
        self.state.lock().await.shut_down
    }
}

#[async_trait]
impl BrowserDriver for ScriptedBrowser {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), AdapterError> {
        let mut state = self.state.lock().await;
        state.ensure_connected()?;
        state.navigations.push(url.to_string());
        if let Some(failure) = state.nav_failures.iter_mut().find(|f| f.url == url) {
            if failure.remaining_successes == 0 {
                return Err(failure.error.clone());
            }
            failure.remaining_successes -= 1;
        }
        debug!(url, "scripted navigation");
        state.main_url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, AdapterError> {
        let state = self.state.lock().await;
        state.ensure_connected()?;
        Ok(state.main_url.clone())
    }

    async fn title(&self) -> Result<String, AdapterError> {
        let state = self.state.lock().await;
        state.ensure_connected()?;
        Ok(state
            .pages
            .get(&state.main_url)
            .map(|page| page.title.clone())
            .unwrap_or_default())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, AdapterError> {
        let mut state = self.state.lock().await;
        state.ensure_connected()?;
        state.evaluations.push(expression.to_string());
        Ok(state
            .evaluation_results
            .iter()
            .find(|(needle, _)| expression.contains(needle.as_str()))
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null))
    }

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<(), AdapterError> {
        let state = self.state.lock().await;
        state.ensure_connected()?;
        match state.element(selector) {
            None => Err(AdapterError::target_not_found(selector, timeout)),
            Some(element) if !element.visible => Err(AdapterError::not_visible(selector, timeout)),
            Some(_) => Ok(()),
        }
    }

    async fn click(&self, selector: &str, timeout: Duration) -> Result<(), AdapterError> {
        let mut state = self.state.lock().await;
        state.ensure_connected()?;
        let element = state
            .element(selector)
            .cloned()
            .ok_or_else(|| AdapterError::target_not_found(selector, timeout))?;
        state.clicks.push(selector.to_string());
        match element.on_click {
            Some(ClickEffect::Navigate(url)) => state.main_url = url,
            Some(ClickEffect::OpenTab(url)) => {
                state.open_tab(url);
            }
            None => {}
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str, timeout: Duration) -> Result<(), AdapterError> {
        let mut state = self.state.lock().await;
        state.ensure_connected()?;
        if state.element(selector).is_none() {
            return Err(AdapterError::target_not_found(selector, timeout));
        }
        state.fills.push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn click_expecting_new_tab(
        &self,
        selector: &str,
        click_timeout: Duration,
        tab_timeout: Duration,
    ) -> Result<NewTab, AdapterError> {
        let mut state = self.state.lock().await;
        state.ensure_connected()?;
        let element = state
            .element(selector)
            .cloned()
            .ok_or_else(|| AdapterError::target_not_found(selector, click_timeout))?;
        state.clicks.push(selector.to_string());
        match element.on_click {
            Some(ClickEffect::OpenTab(url)) => Ok(state.open_tab(url)),
            Some(ClickEffect::Navigate(url)) => {
                state.main_url = url;
                Err(new_tab_timeout(selector, tab_timeout))
            }
            None => Err(new_tab_timeout(selector, tab_timeout)),
        }
    }

    async fn close_tab(&self, tab_id: &str) -> Result<(), AdapterError> {
        let mut state = self.state.lock().await;
        state.ensure_connected()?;
        if tab_id != MAIN_TAB {
            state.tabs.retain(|tab| tab.id != tab_id);
        }
        Ok(())
    }

    async fn close_secondary_tabs(&self) -> Result<usize, AdapterError> {
        let mut state = self.state.lock().await;
        state.ensure_connected()?;
        let closed = state.tabs.len();
        state.tabs.clear();
        Ok(closed)
    }

    async fn tab_urls(&self) -> Result<Vec<String>, AdapterError> {
        let state = self.state.lock().await;
        state.ensure_connected()?;
        let mut urls = vec![state.main_url.clone()];
        urls.extend(state.tabs.iter().map(|tab| tab.url.clone()));
        Ok(urls)
    }

    async fn clear_browsing_state(&self) -> Result<(), AdapterError> {
        let mut state = self.state.lock().await;
        state.ensure_connected()?;
        state.clears += 1;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, AdapterError> {
        let state = self.state.lock().await;
        state.ensure_connected()?;
        Ok(FAKE_PNG.to_vec())
    }

    async fn shutdown(&self) -> Result<(), AdapterError> {
        let mut state = self.state.lock().await;
        state.shut_down = true;
        state.connected = false;
        Ok(())
    }
}

fn new_tab_timeout(selector: &str, waited: Duration) -> AdapterError {
    AdapterError::new(AdapterErrorKind::NewTabTimeout).with_hint(format!(
        "nothing opened within {}ms after clicking `{selector}`",
        waited.as_millis()
    ))
}
