//! Type primitive - replace an input's value

use crate::{errors::ActionError, primitives::StepContext};

pub async fn execute_type_text(
    ctx: StepContext<'_>,
    selector: &str,
    value: &str,
) -> Result<(), ActionError> {
    ctx.highlight(selector).await;
    ctx.driver
        .fill(selector, value, ctx.config.action_timeout())
        .await?;
    Ok(())
}
