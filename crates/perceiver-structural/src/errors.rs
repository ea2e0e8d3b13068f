use cdp_adapter::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PerceptionError {
    #[error("dom snapshot failed: {0}")]
    Snapshot(#[from] AdapterError),
    #[error("malformed dom snapshot: {0}")]
    Malformed(String),
    #[error("page has no summarizable content")]
    EmptyPage,
}

impl PerceptionError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
