//! Test case execution
//!
//! Interprets accepted test cases against the live browser: per-case isolation, one handler
//! per step action, highlighting for the recording, and failure classification.

pub mod classify;
pub mod config;
pub mod errors;
pub mod executor;
pub mod highlight;
pub mod primitives;

pub use classify::{classify_error, classify_failure};
pub use config::ExecutionConfig;
pub use errors::ActionError;
pub use executor::ActionExecutor;
