//! Per-case results and the persisted run report.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::case::TestCaseDesign;

/// Terminal state of one executed case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseVerdict {
    Pass,
    Fail,
    Blocked,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl fmt::Display for CaseVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CaseVerdict::Pass => "Pass",
            CaseVerdict::Fail => "Fail",
            CaseVerdict::Blocked => "Blocked",
            CaseVerdict::NotApplicable => "N/A",
        })
    }
}

/// Sub-classification of a failed case, derived from the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    #[serde(rename = "Fail-Selector")]
    Selector,
    #[serde(rename = "Fail-Assertion")]
    Assertion,
    #[serde(rename = "Fail-Navigation")]
    Navigation,
    #[serde(rename = "Fail-General")]
    General,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Selector => "Fail-Selector",
            FailureKind::Assertion => "Fail-Assertion",
            FailureKind::Navigation => "Fail-Navigation",
            FailureKind::General => "Fail-General",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one executed case. Created once, never mutated after recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub precondition: String,
    #[serde(default)]
    pub test_step: String,
    #[serde(default)]
    pub expected_results: String,
    pub result: CaseVerdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_type: Option<FailureKind>,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl TestCaseResult {
    fn from_case(case: &TestCaseDesign, result: CaseVerdict, details: String) -> Self {
        Self {
            id: case.id.clone(),
            title: case.title.clone(),
            precondition: case.precondition.clone(),
            test_step: case.test_step.clone(),
            expected_results: case.expected_results.clone(),
            result,
            failure_type: None,
            details,
            code: case.code(),
            screenshot: None,
        }
    }

    pub fn pass(case: &TestCaseDesign) -> Self {
        Self::from_case(case, CaseVerdict::Pass, String::new())
    }

    pub fn fail(
        case: &TestCaseDesign,
        kind: Option<FailureKind>,
        details: impl Into<String>,
    ) -> Self {
        let mut result = Self::from_case(case, CaseVerdict::Fail, details.into());
        result.failure_type = kind;
        result
    }

    pub fn blocked(case: &TestCaseDesign, details: impl Into<String>) -> Self {
        Self::from_case(case, CaseVerdict::Blocked, details.into())
    }

    pub fn not_applicable(case: &TestCaseDesign, details: impl Into<String>) -> Self {
        Self::from_case(case, CaseVerdict::NotApplicable, details.into())
    }

    pub fn with_screenshot(mut self, path: impl Into<String>) -> Self {
        self.screenshot = Some(path.into());
        self
    }
}

/// Token counters reported by the text-generation service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    pub fn add(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Which cases count towards the `successRate` denominator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessRateBasis {
    /// Every executed case.
    All,
    /// Executed cases minus `N/A` ones.
    #[default]
    ExcludeNa,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub blocked: usize,
    pub na: usize,
    /// Percentage with one decimal place.
    pub success_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Summary {
    pub fn tally(results: &[TestCaseResult], basis: SuccessRateBasis) -> Self {
        let count = |verdict: CaseVerdict| results.iter().filter(|r| r.result == verdict).count();
        let passed = count(CaseVerdict::Pass);
        let failed = count(CaseVerdict::Fail);
        let blocked = count(CaseVerdict::Blocked);
        let na = count(CaseVerdict::NotApplicable);
        let total = results.len();

        let denominator = match basis {
            SuccessRateBasis::All => total,
            SuccessRateBasis::ExcludeNa => total - na,
        };
        let success_rate = if denominator == 0 {
            0.0
        } else {
            (passed as f64 / denominator as f64 * 1000.0).round() / 10.0
        };

        Self {
            total,
            passed,
            failed,
            blocked,
            na,
            success_rate,
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning;
        self
    }
}

/// Terminal artifact of a run. Always carries a summary, even when the run failed fatally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub usage: TokenUsage,
    pub test_cases: Vec<TestCaseResult>,
    pub summary: Summary,
}
