use std::collections::{BTreeSet, HashSet};

use serde_json::Value;
use smokeprobe_core_types::{
    ActionKind, CandidateCase, RawStep, Signature, Step, TestCaseDesign,
};
use thiserror::Error;
use tracing::{debug, info};

/// Selector fragments the executor's CSS engine cannot evaluate.
const FORBIDDEN_SELECTOR_PARTS: &[&str] = &[
    ":has-text(",
    ":text(",
    ":text-is(",
    ":text-matches(",
    ":contains(",
    "text=",
    "xpath=",
];

/// Titles whose whitespace-free character sets overlap more than this are duplicates.
pub const TITLE_SIMILARITY_THRESHOLD: f64 = 0.6;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RejectReason {
    #[error("steps missing or not an array")]
    MissingSteps,
    #[error("steps array is empty")]
    EmptySteps,
    #[error("title missing")]
    MissingTitle,
    #[error("step {index} is not an object")]
    MalformedStep { index: usize },
    #[error("step {index} uses unknown action '{action}'")]
    UnknownAction { index: usize, action: String },
    #[error("step {index} ('{action}') has no selector")]
    MissingSelector { index: usize, action: ActionKind },
    #[error("step {index} uses unsupported selector '{selector}'")]
    ForbiddenSelector { index: usize, selector: String },
    #[error("only step is a single check")]
    CheckOnly,
    #[error("clicks without any check step")]
    UnverifiedClick,
    #[error("step {index} is invalid: {message}")]
    InvalidStep { index: usize, message: String },
    #[error("identical step sequence already accepted ({signature})")]
    DuplicateSignature { signature: String },
    #[error("title too similar to '{existing}' ({similarity:.2})")]
    SimilarTitle { existing: String, similarity: f64 },
}

impl RejectReason {
    pub fn telemetry_label(&self) -> &'static str {
        match self {
            RejectReason::MissingSteps => "missing_steps",
            RejectReason::EmptySteps => "empty_steps",
            RejectReason::MissingTitle => "missing_title",
            RejectReason::MalformedStep { .. } => "malformed_step",
            RejectReason::UnknownAction { .. } => "unknown_action",
            RejectReason::MissingSelector { .. } => "missing_selector",
            RejectReason::ForbiddenSelector { .. } => "forbidden_selector",
            RejectReason::CheckOnly => "check_only",
            RejectReason::UnverifiedClick => "unverified_click",
            RejectReason::InvalidStep { .. } => "invalid_step",
            RejectReason::DuplicateSignature { .. } => "duplicate_signature",
            RejectReason::SimilarTitle { .. } => "similar_title",
        }
    }
}

/// Structural and similarity filter between the model and the executor.
#[derive(Debug, Clone, Default)]
pub struct CaseValidator;

impl CaseValidator {
    pub fn new() -> Self {
        Self
    }

    /// Accepts the valid, novel candidates, numbering them after the cases accepted so far.
    ///
    /// Both collections are extended with every accepted case so later calls in the same run
    /// see them.
    pub fn filter(
        &self,
        candidates: Vec<CandidateCase>,
        accepted_titles: &mut Vec<String>,
        signatures: &mut HashSet<Signature>,
    ) -> Vec<TestCaseDesign> {
        let offered = candidates.len();
        let mut accepted = Vec::new();
        for candidate in candidates {
            match self.check(&candidate, accepted_titles, signatures) {
                Ok((steps, signature)) => {
                    let title = candidate.title_text();
                    let mut case = TestCaseDesign::new(
                        TestCaseDesign::format_id(accepted_titles.len() + 1),
                        title.clone(),
                        steps,
                    );
                    case.precondition = candidate.precondition_text();
                    case.test_step = candidate.test_step_text();
                    case.expected_results = candidate.expected_results_text();
                    signatures.insert(signature);
                    accepted_titles.push(title);
                    accepted.push(case);
                }
                Err(reason) => {
                    debug!(
                        title = %candidate.title_text(),
                        reason = reason.telemetry_label(),
                        detail = %reason,
                        "rejected candidate case"
                    );
                }
            }
        }
        info!(offered, accepted = accepted.len(), "validated candidate batch");
        accepted
    }

    /// Runs every rule against one candidate and returns its typed steps when it passes.
    ///
    /// The returned signature is the one the duplicate rule compared, so callers must record
    /// exactly that value.
    pub fn check(
        &self,
        candidate: &CandidateCase,
        accepted_titles: &[String],
        signatures: &HashSet<Signature>,
    ) -> Result<(Vec<Step>, Signature), RejectReason> {
        let raw_steps = match candidate.steps.as_ref() {
            Some(Value::Array(items)) if items.is_empty() => return Err(RejectReason::EmptySteps),
            Some(Value::Array(items)) => items,
            _ => return Err(RejectReason::MissingSteps),
        };
        let title = candidate.title_text();
        if title.is_empty() {
            return Err(RejectReason::MissingTitle);
        }

        let mut steps = Vec::with_capacity(raw_steps.len());
        for (index, item) in raw_steps.iter().enumerate() {
            if !item.is_object() {
                return Err(RejectReason::MalformedStep { index });
            }
            let raw: RawStep = serde_json::from_value(item.clone())
                .map_err(|_| RejectReason::MalformedStep { index })?;
            steps.push(raw);
        }

        let mut kinds = Vec::with_capacity(steps.len());
        for (index, raw) in steps.iter().enumerate() {
            let kind = raw.kind().ok_or_else(|| RejectReason::UnknownAction {
                index,
                action: raw.action.clone().unwrap_or_default(),
            })?;
            if kind.requires_selector() {
                let selector = raw
                    .selector()
                    .ok_or(RejectReason::MissingSelector { index, action: kind })?;
                if is_forbidden_selector(selector) {
                    return Err(RejectReason::ForbiddenSelector {
                        index,
                        selector: selector.to_string(),
                    });
                }
            }
            kinds.push(kind);
        }

        if kinds == [ActionKind::Check] {
            return Err(RejectReason::CheckOnly);
        }
        if kinds.iter().any(ActionKind::is_click) && !kinds.contains(&ActionKind::Check) {
            return Err(RejectReason::UnverifiedClick);
        }

        let steps = steps
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                Step::try_from(raw).map_err(|err| RejectReason::InvalidStep {
                    index,
                    message: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let signature = Signature::from_steps(&steps);
        if signatures.contains(&signature) {
            return Err(RejectReason::DuplicateSignature {
                signature: signature.to_string(),
            });
        }

        if let Some((existing, similarity)) = accepted_titles
            .iter()
            .map(|existing| (existing, title_similarity(existing, &title)))
            .find(|(_, similarity)| *similarity > TITLE_SIMILARITY_THRESHOLD)
        {
            return Err(RejectReason::SimilarTitle {
                existing: existing.clone(),
                similarity,
            });
        }

        Ok((steps, signature))
    }
}

pub fn is_forbidden_selector(selector: &str) -> bool {
    let trimmed = selector.trim_start();
    trimmed.starts_with("//")
        || trimmed.starts_with("(//")
        || FORBIDDEN_SELECTOR_PARTS
            .iter()
            .any(|part| selector.contains(part))
}

/// Jaccard index of the character sets of both titles, whitespace ignored.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let left: BTreeSet<char> = a.chars().filter(|c| !c.is_whitespace()).collect();
    let right: BTreeSet<char> = b.chars().filter(|c| !c.is_whitespace()).collect();
    let union = left.union(&right).count();
    if union == 0 {
        return 1.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}
