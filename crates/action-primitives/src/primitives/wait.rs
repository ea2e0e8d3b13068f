//! Wait primitive - fixed pause, capped by the executor config

use tokio::time::sleep;
use tracing::debug;

use crate::{errors::ActionError, primitives::StepContext};

pub async fn execute_wait(ctx: StepContext<'_>, duration_ms: u64) -> Result<(), ActionError> {
    let pause = ctx.config.wait_duration(duration_ms);
    if pause.as_millis() < u128::from(duration_ms) {
        debug!(
            requested_ms = duration_ms,
            max_wait_ms = ctx.config.max_wait_ms,
            "clamping wait step"
        );
    }
    sleep(pause).await;
    Ok(())
}
