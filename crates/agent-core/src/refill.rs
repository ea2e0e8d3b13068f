//! Keeps asking the model for cases until the target is met or the attempt budget runs out.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use smokeprobe_core_types::{PageContext, Signature, TestCaseDesign, TokenUsage};
use tracing::{debug, info, warn};

use crate::generation::GenerationClient;
use crate::prompt::PromptBuilder;
use crate::validator::CaseValidator;

/// Terminal state of a refill run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefillState {
    Satisfied,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    NeedMore,
    Request { count: usize },
    Validate,
    Done(RefillState),
}

/// Everything the stages share, threaded through explicitly.
#[derive(Debug, Default)]
pub struct GenerationState {
    pub accepted: Vec<TestCaseDesign>,
    pub titles: Vec<String>,
    pub signatures: HashSet<Signature>,
    pub attempts: usize,
}

impl GenerationState {
    pub fn next_id(&self) -> String {
        TestCaseDesign::format_id(self.titles.len() + 1)
    }
}

#[derive(Debug, Clone)]
pub struct RefillOutcome {
    pub cases: Vec<TestCaseDesign>,
    pub attempts: usize,
    pub state: RefillState,
    /// Cases still missing from the target; zero when satisfied.
    pub shortfall: usize,
    pub usage: TokenUsage,
}

impl RefillOutcome {
    /// Human readable note for the report when the target was not reached.
    pub fn warning(&self, target: usize) -> Option<String> {
        (self.shortfall > 0).then(|| {
            format!(
                "requested {target} test cases but only {} valid unique cases were generated after {} attempts",
                self.cases.len(),
                self.attempts
            )
        })
    }
}

pub struct RefillLoop {
    prompt: PromptBuilder,
    client: GenerationClient,
    validator: CaseValidator,
    batch_size: usize,
    max_attempts: usize,
}

impl RefillLoop {
    pub fn new(
        prompt: PromptBuilder,
        client: GenerationClient,
        validator: CaseValidator,
        batch_size: usize,
        max_attempts: usize,
    ) -> Self {
        Self {
            prompt,
            client,
            validator,
            batch_size: batch_size.max(1),
            max_attempts,
        }
    }

    pub async fn generate(&mut self, context: &PageContext, target: usize) -> RefillOutcome {
        let mut state = GenerationState::default();
        let mut pending = Vec::new();
        let mut stage = Stage::NeedMore;

        let terminal = loop {
            stage = match stage {
                Stage::NeedMore => self.plan_next(&state, target),
                Stage::Request { count } => {
                    let prompt =
                        self.prompt
                            .build(context, count, &state.next_id(), &state.titles);
                    pending = self.client.invoke(&prompt, state.attempts).await;
                    state.attempts += 1;
                    Stage::Validate
                }
                Stage::Validate => {
                    let candidates = std::mem::take(&mut pending);
                    let offered = candidates.len();
                    let accepted = self.validator.filter(
                        candidates,
                        &mut state.titles,
                        &mut state.signatures,
                    );
                    let room = target.saturating_sub(state.accepted.len());
                    debug!(
                        attempt = state.attempts,
                        offered,
                        accepted = accepted.len(),
                        room,
                        "refill iteration validated"
                    );
                    state.accepted.extend(accepted.into_iter().take(room));
                    Stage::NeedMore
                }
                Stage::Done(terminal) => break terminal,
            };
        };

        let shortfall = target.saturating_sub(state.accepted.len());
        match terminal {
            RefillState::Satisfied => info!(
                cases = state.accepted.len(),
                attempts = state.attempts,
                "test case generation satisfied"
            ),
            RefillState::Exhausted => warn!(
                cases = state.accepted.len(),
                target,
                attempts = state.attempts,
                shortfall,
                "test case generation exhausted its attempt budget"
            ),
        }

        RefillOutcome {
            cases: state.accepted,
            attempts: state.attempts,
            state: terminal,
            shortfall,
            usage: self.client.usage(),
        }
    }

    fn plan_next(&self, state: &GenerationState, target: usize) -> Stage {
        let remaining = target.saturating_sub(state.accepted.len());
        if remaining == 0 {
            Stage::Done(RefillState::Satisfied)
        } else if state.attempts >= self.max_attempts {
            Stage::Done(RefillState::Exhausted)
        } else {
            Stage::Request {
                count: remaining.min(self.batch_size),
            }
        }
    }
}
