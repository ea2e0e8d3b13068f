//! Maps step failures onto report failure kinds.

use cdp_adapter::AdapterErrorKind;
use smokeprobe_core_types::FailureKind;

use crate::errors::ActionError;

/// Ordered `(substring, kind)` table; the first match wins. Patterns are lowercase and
/// matched against the lowercased message.
pub const FAILURE_PATTERNS: &[(&str, FailureKind)] = &[
    ("locator", FailureKind::Selector),
    ("selector", FailureKind::Selector),
    ("target element not found", FailureKind::Selector),
    ("is not a valid selector", FailureKind::Selector),
    ("queryselector", FailureKind::Selector),
    ("not visible", FailureKind::Assertion),
    ("assertion", FailureKind::Assertion),
    ("expected", FailureKind::Assertion),
    ("tobevisible", FailureKind::Assertion),
    ("timeout", FailureKind::Navigation),
    ("timed out", FailureKind::Navigation),
    ("navigation", FailureKind::Navigation),
    ("net::err", FailureKind::Navigation),
    ("new tab", FailureKind::Navigation),
];

/// Classifies by error variant first. Only errors without a telling kind fall back to the
/// message table, and then only on the driver's hint text.
pub fn classify_error(error: &ActionError) -> FailureKind {
    match error {
        ActionError::Driver(err) => match err.kind {
            AdapterErrorKind::TargetNotFound => FailureKind::Selector,
            AdapterErrorKind::NotVisible => FailureKind::Assertion,
            AdapterErrorKind::NavTimeout
            | AdapterErrorKind::NavFailed
            | AdapterErrorKind::NewTabTimeout => FailureKind::Navigation,
            AdapterErrorKind::Script
            | AdapterErrorKind::Unavailable
            | AdapterErrorKind::CdpIo
            | AdapterErrorKind::Internal => {
                classify_failure(err.hint.as_deref().unwrap_or_default())
            }
        },
        ActionError::EmptyTitle | ActionError::UrlMismatch { .. } => FailureKind::Assertion,
        ActionError::NoSteps | ActionError::NoValidation => FailureKind::General,
    }
}

pub fn classify_failure(message: &str) -> FailureKind {
    let lower = message.to_lowercase();
    FAILURE_PATTERNS
        .iter()
        .find(|(pattern, _)| lower.contains(pattern))
        .map(|(_, kind)| *kind)
        .unwrap_or(FailureKind::General)
}
