use async_trait::async_trait;
use cdp_adapter::BrowserDriver;
use smokeprobe_core_types::PageContext;

use crate::errors::PerceptionError;

#[async_trait]
pub trait StructuralPerceiver: Send + Sync {
    /// Summarize the page currently loaded in the driver's main tab, truncated to
    /// `max_chars` characters.
    async fn summarize(
        &self,
        driver: &dyn BrowserDriver,
        max_chars: usize,
    ) -> Result<PageContext, PerceptionError>;
}
