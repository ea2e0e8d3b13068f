use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AdapterError;

/// Identifier every driver uses for the primary tab.
pub const MAIN_TAB: &str = "main";

/// A tab opened as a side effect of a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTab {
    pub id: String,
    pub url: String,
}

/// Minimal browser capability surface consumed by the perception and execution layers.
///
/// All operations act on the main tab unless stated otherwise. Every waiting operation is
/// bounded by its own timeout and fails instead of blocking.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Load `url` in the main tab and wait for the load event.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), AdapterError>;

    async fn current_url(&self) -> Result<String, AdapterError>;

    async fn title(&self) -> Result<String, AdapterError>;

    /// Evaluate an expression in page context and return its JSON value.
    async fn evaluate(&self, expression: &str) -> Result<Value, AdapterError>;

    /// Wait until the first element matching `selector` exists and is rendered visibly.
    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<(), AdapterError>;

    /// Dispatch the click from script, bypassing occlusion and interactability checks.
    async fn click(&self, selector: &str, timeout: Duration) -> Result<(), AdapterError>;

    /// Replace the value of a form control and fire `input`/`change`.
    async fn fill(&self, selector: &str, text: &str, timeout: Duration)
        -> Result<(), AdapterError>;

    /// Force-click `selector` and wait for a tab to open and finish loading.
    async fn click_expecting_new_tab(
        &self,
        selector: &str,
        click_timeout: Duration,
        tab_timeout: Duration,
    ) -> Result<NewTab, AdapterError>;

    async fn close_tab(&self, tab_id: &str) -> Result<(), AdapterError>;

    /// Close every tab except the main one; returns how many were closed.
    async fn close_secondary_tabs(&self) -> Result<usize, AdapterError>;

    /// URLs of all open tabs, main tab first.
    async fn tab_urls(&self) -> Result<Vec<String>, AdapterError>;

    /// Drop cookies plus local and session storage.
    async fn clear_browsing_state(&self) -> Result<(), AdapterError>;

    /// PNG capture of the main tab viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, AdapterError>;

    /// Stop recordings and release the browser.
    async fn shutdown(&self) -> Result<(), AdapterError>;
}
