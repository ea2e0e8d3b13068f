//! ClickNewTab primitive - click something that opens a tab, then close that tab

use tracing::{debug, info};

use crate::{errors::ActionError, primitives::StepContext};

pub async fn execute_click_new_tab(
    ctx: StepContext<'_>,
    selector: &str,
) -> Result<(), ActionError> {
    ctx.highlight(selector).await;
    let tab = ctx
        .driver
        .click_expecting_new_tab(
            selector,
            ctx.config.action_timeout(),
            ctx.config.new_tab_timeout(),
        )
        .await?;
    info!(selector, url = %tab.url, "new tab opened");
    if let Err(err) = ctx.driver.close_tab(&tab.id).await {
        debug!(tab = %tab.id, error = %err, "failed to close new tab");
    }
    Ok(())
}
