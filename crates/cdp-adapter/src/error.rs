use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// High-level error categories surfaced by the driver.
///
/// The display strings are matched by the executor's failure classification, so they
/// name the symptom plainly.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterErrorKind {
    #[error("navigation timed out")]
    NavTimeout,
    #[error("navigation failed")]
    NavFailed,
    #[error("target element not found")]
    TargetNotFound,
    #[error("element not visible")]
    NotVisible,
    #[error("timed out waiting for new tab")]
    NewTabTimeout,
    #[error("script evaluation failed")]
    Script,
    #[error("browser session unavailable")]
    Unavailable,
    #[error("cdp i/o failure")]
    CdpIo,
    #[error("internal error")]
    Internal,
}

/// Enriched error metadata passed back to higher layers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub hint: Option<String>,
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for AdapterError {}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind) -> Self {
        Self {
            kind,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn target_not_found(selector: &str, waited: Duration) -> Self {
        Self::new(AdapterErrorKind::TargetNotFound).with_hint(format!(
            "no element matches `{selector}` after {}ms",
            waited.as_millis()
        ))
    }

    pub fn not_visible(selector: &str, waited: Duration) -> Self {
        Self::new(AdapterErrorKind::NotVisible).with_hint(format!(
            "`{selector}` stayed hidden for {}ms",
            waited.as_millis()
        ))
    }

    pub fn nav_timeout(url: &str, waited: Duration) -> Self {
        Self::new(AdapterErrorKind::NavTimeout)
            .with_hint(format!("{url} did not load within {}ms", waited.as_millis()))
    }

    pub fn unavailable(hint: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Unavailable).with_hint(hint)
    }

    /// Whether the browser itself is gone rather than one operation failing.
    pub fn is_session_loss(&self) -> bool {
        matches!(self.kind, AdapterErrorKind::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_hint() {
        let err = AdapterError::target_not_found("button.submit", Duration::from_millis(5000));
        assert_eq!(
            err.to_string(),
            "target element not found: no element matches `button.submit` after 5000ms"
        );
        assert!(!err.is_session_loss());
    }

    #[test]
    fn nav_timeout_names_the_url() {
        let err = AdapterError::nav_timeout("https://example.com", Duration::from_secs(30));
        assert_eq!(err.hint.as_deref(), Some("https://example.com did not load within 30000ms"));
        assert!(err.to_string().starts_with("navigation timed out"));
    }
}
