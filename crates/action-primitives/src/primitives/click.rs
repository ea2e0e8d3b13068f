//! Click primitive - forced click that ignores occlusion

use crate::{errors::ActionError, primitives::StepContext};

pub async fn execute_click(ctx: StepContext<'_>, selector: &str) -> Result<(), ActionError> {
    ctx.highlight(selector).await;
    ctx.driver
        .click(selector, ctx.config.action_timeout())
        .await?;
    Ok(())
}
