//! Shared data model for SmokeProbe.
//!
//! Everything that crosses a crate boundary lives here: the AI-authored test case designs,
//! their typed steps, per-case results and the persisted run report.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod case;
pub mod report;

pub use case::{
    ActionKind, CandidateCase, PageContext, RawStep, Signature, Step, StepAction,
    TestCaseDesign, DEFAULT_WAIT_MS,
};
pub use report::{
    CaseVerdict, FailureKind, RunReport, SuccessRateBasis, Summary, TestCaseResult, TokenUsage,
};

/// Errors raised while decoding or validating shared model values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid step: {0}")]
    InvalidStep(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

impl CoreError {
    pub fn invalid_step(message: impl Into<String>) -> Self {
        Self::InvalidStep(message.into())
    }
}

/// Identifier of a single SmokeProbe run; also names the run's artifact directory.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
