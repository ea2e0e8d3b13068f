//! Error types for test case execution

use cdp_adapter::AdapterError;
use thiserror::Error;

/// Why a step, or a case as a whole, did not pass.
///
/// The display strings feed the failure classification table, so they name the symptom in
/// plain words.
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// The browser driver rejected or timed out an operation
    #[error("{0}")]
    Driver(#[from] AdapterError),

    /// A title check found an empty document title
    #[error("assertion failed: document title is empty")]
    EmptyTitle,

    /// No open tab has a URL containing the expected fragment
    #[error("expected a tab URL containing '{expected}', found {}", .actual.join(", "))]
    UrlMismatch {
        expected: String,
        actual: Vec<String>,
    },

    /// The case carries no steps at all
    #[error("no steps")]
    NoSteps,

    /// Every step passed but none of them verified anything
    #[error("no validation step")]
    NoValidation,
}

impl ActionError {
    /// The browser itself went away; the case says nothing about the page.
    pub fn is_session_loss(&self) -> bool {
        matches!(self, ActionError::Driver(err) if err.is_session_loss())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::AdapterErrorKind;

    #[test]
    fn url_mismatch_lists_every_tab() {
        let err = ActionError::UrlMismatch {
            expected: "/main".into(),
            actual: vec!["https://a.test/".into(), "https://b.test/x".into()],
        };
        assert_eq!(
            err.to_string(),
            "expected a tab URL containing '/main', found https://a.test/, https://b.test/x"
        );
    }

    #[test]
    fn session_loss_only_for_unavailable_driver() {
        assert!(ActionError::from(AdapterError::unavailable("gone")).is_session_loss());
        assert!(!ActionError::from(AdapterError::new(AdapterErrorKind::CdpIo)).is_session_loss());
        assert!(!ActionError::NoSteps.is_session_loss());
    }
}
