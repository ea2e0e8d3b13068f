//! Test case designs, steps and the structural signature used for de-duplication.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CoreError;

/// Pause applied by a `wait` step that does not carry a usable duration.
pub const DEFAULT_WAIT_MS: u64 = 1_000;

/// Fixed enumeration of step actions understood by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Check,
    Click,
    Type,
    Wait,
    ClickNewTab,
    CheckUrl,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Check,
        ActionKind::Click,
        ActionKind::Type,
        ActionKind::Wait,
        ActionKind::ClickNewTab,
        ActionKind::CheckUrl,
    ];

    /// Parses the wire name, ignoring ASCII case.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Check => "check",
            ActionKind::Click => "click",
            ActionKind::Type => "type",
            ActionKind::Wait => "wait",
            ActionKind::ClickNewTab => "clickNewTab",
            ActionKind::CheckUrl => "checkUrl",
        }
    }

    pub fn requires_selector(&self) -> bool {
        matches!(
            self,
            ActionKind::Check | ActionKind::Click | ActionKind::Type | ActionKind::ClickNewTab
        )
    }

    /// Actions that interact with the page and therefore need a verifying `check`.
    pub fn is_click(&self) -> bool {
        matches!(self, ActionKind::Click | ActionKind::ClickNewTab)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step exactly as the model emitted it. Field presence is not trusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStep {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

impl RawStep {
    pub fn kind(&self) -> Option<ActionKind> {
        self.action.as_deref().and_then(ActionKind::parse)
    }

    /// Selector with surrounding whitespace removed; `None` when absent or blank.
    pub fn selector(&self) -> Option<&str> {
        self.selector
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn value_text(&self) -> Option<String> {
        match self.value.as_ref()? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    fn value_millis(&self) -> Option<u64> {
        match self.value.as_ref()? {
            Value::Number(number) => number
                .as_u64()
                .or_else(|| number.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64)),
            Value::String(text) => text.trim().trim_end_matches("ms").trim().parse().ok(),
            _ => None,
        }
    }
}

/// Typed step action. Each variant carries exactly the data its handler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Check { selector: String },
    Click { selector: String },
    Type { selector: String, value: String },
    Wait { duration_ms: u64 },
    ClickNewTab { selector: String },
    CheckUrl { expected: String },
}

impl StepAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            StepAction::Check { .. } => ActionKind::Check,
            StepAction::Click { .. } => ActionKind::Click,
            StepAction::Type { .. } => ActionKind::Type,
            StepAction::Wait { .. } => ActionKind::Wait,
            StepAction::ClickNewTab { .. } => ActionKind::ClickNewTab,
            StepAction::CheckUrl { .. } => ActionKind::CheckUrl,
        }
    }

    pub fn selector(&self) -> Option<&str> {
        match self {
            StepAction::Check { selector }
            | StepAction::Click { selector }
            | StepAction::Type { selector, .. }
            | StepAction::ClickNewTab { selector } => Some(selector),
            StepAction::Wait { .. } | StepAction::CheckUrl { .. } => None,
        }
    }
}

/// One executable step of an accepted test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStep", into = "RawStep")]
pub struct Step {
    pub action: StepAction,
    pub desc: Option<String>,
}

impl Step {
    pub fn new(action: StepAction) -> Self {
        Self { action, desc: None }
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn check(selector: impl Into<String>) -> Self {
        Self::new(StepAction::Check {
            selector: selector.into(),
        })
    }

    pub fn click(selector: impl Into<String>) -> Self {
        Self::new(StepAction::Click {
            selector: selector.into(),
        })
    }

    pub fn type_text(selector: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(StepAction::Type {
            selector: selector.into(),
            value: value.into(),
        })
    }

    pub fn wait(duration_ms: u64) -> Self {
        Self::new(StepAction::Wait { duration_ms })
    }

    pub fn click_new_tab(selector: impl Into<String>) -> Self {
        Self::new(StepAction::ClickNewTab {
            selector: selector.into(),
        })
    }

    pub fn check_url(expected: impl Into<String>) -> Self {
        Self::new(StepAction::CheckUrl {
            expected: expected.into(),
        })
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }
}

impl TryFrom<RawStep> for Step {
    type Error = CoreError;

    fn try_from(raw: RawStep) -> Result<Self, Self::Error> {
        let name = raw
            .action
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| CoreError::invalid_step("missing action"))?;
        let kind = ActionKind::parse(name).ok_or_else(|| CoreError::UnknownAction(name.into()))?;

        let selector = || {
            raw.selector()
                .map(str::to_string)
                .ok_or_else(|| CoreError::invalid_step(format!("'{kind}' requires a selector")))
        };

        let action = match kind {
            ActionKind::Check => StepAction::Check {
                selector: selector()?,
            },
            ActionKind::Click => StepAction::Click {
                selector: selector()?,
            },
            ActionKind::Type => StepAction::Type {
                selector: selector()?,
                value: raw.value_text().unwrap_or_default(),
            },
            ActionKind::Wait => StepAction::Wait {
                duration_ms: raw.value_millis().unwrap_or(DEFAULT_WAIT_MS),
            },
            ActionKind::ClickNewTab => StepAction::ClickNewTab {
                selector: selector()?,
            },
            ActionKind::CheckUrl => StepAction::CheckUrl {
                expected: raw
                    .value_text()
                    .or_else(|| raw.selector().map(str::to_string))
                    .filter(|value| !value.trim().is_empty())
                    .ok_or_else(|| CoreError::invalid_step("'checkUrl' requires a value"))?,
            },
        };

        Ok(Step {
            action,
            desc: raw.desc.filter(|desc| !desc.trim().is_empty()),
        })
    }
}

impl From<Step> for RawStep {
    fn from(step: Step) -> Self {
        let action = Some(step.kind().as_str().to_string());
        let (selector, value) = match step.action {
            StepAction::Check { selector }
            | StepAction::Click { selector }
            | StepAction::ClickNewTab { selector } => (Some(selector), None),
            StepAction::Type { selector, value } => (Some(selector), Some(Value::String(value))),
            StepAction::Wait { duration_ms } => (None, Some(Value::from(duration_ms))),
            StepAction::CheckUrl { expected } => (None, Some(Value::String(expected))),
        };
        RawStep {
            action,
            selector,
            value,
            desc: step.desc,
        }
    }
}

/// Structural fingerprint: ordered `action:selector` pairs joined by `|`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    pub fn from_steps(steps: &[Step]) -> Self {
        Self::build(steps.iter().map(|step| {
            (
                step.kind().as_str().to_string(),
                step.action.selector().unwrap_or_default().to_string(),
            )
        }))
    }

    fn build(pairs: impl Iterator<Item = (String, String)>) -> Self {
        Self(
            pairs
                .map(|(action, selector)| format!("{action}:{selector}"))
                .collect::<Vec<_>>()
                .join("|"),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A test case exactly as parsed from the model output, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateCase {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub precondition: Option<Value>,
    #[serde(default)]
    pub test_step: Option<Value>,
    #[serde(default, alias = "expectedResult")]
    pub expected_results: Option<Value>,
    #[serde(default)]
    pub steps: Option<Value>,
}

impl CandidateCase {
    pub fn title_text(&self) -> String {
        text_field(self.title.as_ref())
    }

    pub fn precondition_text(&self) -> String {
        text_field(self.precondition.as_ref())
    }

    pub fn test_step_text(&self) -> String {
        text_field(self.test_step.as_ref())
    }

    pub fn expected_results_text(&self) -> String {
        text_field(self.expected_results.as_ref())
    }
}

/// Flattens a free-text field; models sometimes answer with a list of lines.
fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.trim().to_string(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Accepted, frozen test case. Only the validator constructs these from model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseDesign {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub precondition: String,
    #[serde(default)]
    pub test_step: String,
    #[serde(default)]
    pub expected_results: String,
    pub steps: Vec<Step>,
}

impl TestCaseDesign {
    pub fn new(id: impl Into<String>, title: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            precondition: String::new(),
            test_step: String::new(),
            expected_results: String::new(),
            steps,
        }
    }

    /// Sequential identifier in the `TC-NNN` format, 1-based.
    pub fn format_id(ordinal: usize) -> String {
        format!("TC-{ordinal:03}")
    }

    pub fn signature(&self) -> Signature {
        Signature::from_steps(&self.steps)
    }

    pub fn has_check(&self) -> bool {
        self.steps.iter().any(|step| step.kind() == ActionKind::Check)
    }

    /// Steps serialized back to their wire form, kept in the report for auditing.
    pub fn code(&self) -> String {
        serde_json::to_string_pretty(&self.steps).unwrap_or_default()
    }
}

/// Serialized, size-bounded DOM summary shared by every generation call of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext(String);

impl PageContext {
    /// Truncates on a char boundary so the prompt never exceeds `max_chars` characters.
    pub fn new(summary: impl Into<String>, max_chars: usize) -> Self {
        let summary = summary.into();
        match summary.char_indices().nth(max_chars) {
            Some((cut, _)) => Self(summary[..cut].to_string()),
            None => Self(summary),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
