//! One handler per step action
//!
//! 1. check - highlight, then assert visibility (or a non-empty document title)
//! 2. click - highlight, then force-click
//! 3. type - highlight, then set the value and fire input/change
//! 4. wait - plain sleep, never longer than `max_wait_ms`
//! 5. clickNewTab - click, wait for the popup to load, close it
//! 6. checkUrl - assert some open tab's URL contains the expected fragment

mod check;
mod check_url;
mod click;
mod new_tab;
mod type_text;
mod wait;

pub use check::*;
pub use check_url::*;
pub use click::*;
pub use new_tab::*;
pub use type_text::*;
pub use wait::*;

use cdp_adapter::BrowserDriver;
use smokeprobe_core_types::StepAction;
use tokio::time::sleep;
use tracing::debug;

use crate::config::ExecutionConfig;
use crate::errors::ActionError;
use crate::highlight;

/// Borrowed view of what every handler needs.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    pub driver: &'a dyn BrowserDriver,
    pub config: &'a ExecutionConfig,
}

impl<'a> StepContext<'a> {
    pub fn new(driver: &'a dyn BrowserDriver, config: &'a ExecutionConfig) -> Self {
        Self { driver, config }
    }

    /// Outlines the element for the recording, pauses, then removes the outline.
    /// Decoration only: a missing element is left for the action itself to report.
    pub async fn highlight(&self, selector: &str) {
        match self.driver.evaluate(&highlight::highlight(selector)).await {
            Ok(value) if value.as_bool() == Some(true) => {
                sleep(self.config.highlight_pause()).await;
                if let Err(err) = self.driver.evaluate(&highlight::unhighlight(selector)).await {
                    debug!(selector, error = %err, "failed to remove highlight");
                }
            }
            Ok(_) => debug!(selector, "nothing to highlight"),
            Err(err) => debug!(selector, error = %err, "highlight failed"),
        }
    }
}

/// Dispatches one step to its handler.
pub async fn execute_step(ctx: StepContext<'_>, action: &StepAction) -> Result<(), ActionError> {
    match action {
        StepAction::Check { selector } => execute_check(ctx, selector).await,
        StepAction::Click { selector } => execute_click(ctx, selector).await,
        StepAction::Type { selector, value } => execute_type_text(ctx, selector, value).await,
        StepAction::Wait { duration_ms } => execute_wait(ctx, *duration_ms).await,
        StepAction::ClickNewTab { selector } => execute_click_new_tab(ctx, selector).await,
        StepAction::CheckUrl { expected } => execute_check_url(ctx, expected).await,
    }
}
