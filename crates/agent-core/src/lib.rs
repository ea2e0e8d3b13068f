//! Test case generation: prompt construction, model invocation, validation and the
//! refill loop that keeps asking until enough distinct cases are accepted.

pub mod config;
pub mod errors;
pub mod generation;
pub mod json;
pub mod llm_provider;
pub mod openai;
pub mod prompt;
pub mod refill;
pub mod validator;

pub use config::GenerationConfig;
pub use errors::AgentError;
pub use generation::GenerationClient;
pub use llm_provider::{Completion, CompletionRequest, LlmProvider, ScriptedLlmProvider};
pub use openai::{OpenAiConfig, OpenAiLlmProvider};
pub use prompt::PromptBuilder;
pub use refill::{GenerationState, RefillLoop, RefillOutcome, RefillState};
pub use validator::{CaseValidator, RejectReason};
