//! CheckUrl primitive - the active tab, or any other open tab, must contain the fragment

use tracing::debug;

use crate::{errors::ActionError, primitives::StepContext};

pub async fn execute_check_url(ctx: StepContext<'_>, expected: &str) -> Result<(), ActionError> {
    let current = ctx.driver.current_url().await?;
    if current.contains(expected) {
        return Ok(());
    }

    let urls = ctx.driver.tab_urls().await?;
    if let Some(found) = urls.iter().find(|url| url.contains(expected)) {
        debug!(expected, url = %found, "expected url found in another tab");
        return Ok(());
    }
    Err(ActionError::UrlMismatch {
        expected: expected.to_string(),
        actual: urls,
    })
}
