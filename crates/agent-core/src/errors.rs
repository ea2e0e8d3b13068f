use thiserror::Error;

/// Errors emitted by the agent-core crate.
///
/// Only provider construction and the providers themselves surface these; the generation
/// client absorbs them into empty batches.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Raised when a provider is configured without what it needs to run.
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),

    /// The request never produced an HTTP response.
    #[error("llm transport failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("llm returned {status}: {body}")]
    Http { status: u16, body: String },

    /// Every configured key was rate limited.
    #[error("{0}")]
    RateLimited(String),

    /// The response body did not have the expected shape.
    #[error("llm response invalid: {0}")]
    MalformedResponse(String),

    /// The scripted provider was told to fail this call.
    #[error("scripted failure: {0}")]
    Scripted(String),
}

impl AgentError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }
}
