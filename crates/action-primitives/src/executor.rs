use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use cdp_adapter::{AdapterError, BrowserDriver};
use smokeprobe_core_types::{ActionKind, Step, TestCaseDesign, TestCaseResult};
use tracing::{debug, info, warn};

use crate::classify::classify_error;
use crate::config::ExecutionConfig;
use crate::errors::ActionError;
use crate::highlight;
use crate::primitives::{execute_step, StepContext};

/// Runs accepted test cases one at a time against the driver's main tab.
pub struct ActionExecutor {
    driver: Arc<dyn BrowserDriver>,
    target_url: String,
    config: ExecutionConfig,
    screenshot_dir: Option<PathBuf>,
}

impl ActionExecutor {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        target_url: impl Into<String>,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            driver,
            target_url: target_url.into(),
            config,
            screenshot_dir: None,
        }
    }

    /// Failure screenshots land in `dir` when enabled in the config.
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = Some(dir.into());
        self
    }

    /// Executes one case in isolation and reports its outcome. Never fails.
    pub async fn run(&self, case: &TestCaseDesign) -> TestCaseResult {
        let started = Instant::now();
        info!(case = %case.id, title = %case.title, steps = case.steps.len(), "running test case");

        if let Err(err) = self.isolate(case).await {
            return if err.is_session_loss() {
                warn!(case = %case.id, error = %err, "browser unavailable; case not applicable");
                TestCaseResult::not_applicable(case, format!("browser session unavailable: {err}"))
            } else {
                warn!(case = %case.id, error = %err, "page could not be reloaded; case blocked");
                TestCaseResult::blocked(case, format!("page could not be reloaded: {err}"))
            };
        }

        let result = match self.execute_steps(case).await {
            Ok(()) => TestCaseResult::pass(case),
            Err(failure) if failure.error.is_session_loss() => {
                TestCaseResult::not_applicable(case, failure.details())
            }
            Err(failure) => {
                let kind = classify_error(&failure.error);
                let result = TestCaseResult::fail(case, Some(kind), failure.details());
                match self.capture_failure(case).await {
                    Some(path) => result.with_screenshot(path),
                    None => result,
                }
            }
        };

        info!(
            case = %case.id,
            result = %result.result,
            failure_type = result.failure_type.map(|kind| kind.label()).unwrap_or(""),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "test case finished"
        );
        result
    }

    /// Closes stray tabs, drops cookies and storage, reloads the target and shows the banner.
    async fn isolate(&self, case: &TestCaseDesign) -> Result<(), AdapterError> {
        let closed = self.driver.close_secondary_tabs().await?;
        if closed > 0 {
            debug!(case = %case.id, closed, "closed tabs left over from the previous case");
        }
        self.driver.clear_browsing_state().await?;
        self.driver
            .navigate(&self.target_url, self.config.navigation_timeout())
            .await?;
        if let Err(err) = self
            .driver
            .evaluate(&highlight::show_overlay(&case.id, &case.title))
            .await
        {
            debug!(case = %case.id, error = %err, "failed to show case overlay");
        }
        Ok(())
    }

    async fn execute_steps(&self, case: &TestCaseDesign) -> Result<(), StepFailure> {
        if case.steps.is_empty() {
            return Err(StepFailure::whole_case(ActionError::NoSteps));
        }

        let steps = cleaned_steps(&case.steps);
        let ctx = StepContext::new(self.driver.as_ref(), &self.config);
        for (index, step) in steps.iter().enumerate() {
            debug!(
                case = %case.id,
                step = index + 1,
                action = %step.kind(),
                desc = step.desc.as_deref().unwrap_or(""),
                "executing step"
            );
            if let Err(error) = execute_step(ctx, &step.action).await {
                return Err(StepFailure {
                    step: Some((index + 1, describe(step))),
                    error,
                });
            }
        }

        if !steps.iter().any(|step| step.kind() == ActionKind::Check) {
            return Err(StepFailure::whole_case(ActionError::NoValidation));
        }
        Ok(())
    }

    async fn capture_failure(&self, case: &TestCaseDesign) -> Option<String> {
        if !self.config.screenshot_on_failure {
            return None;
        }
        let dir = self.screenshot_dir.as_ref()?;
        let bytes = match self.driver.screenshot().await {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(case = %case.id, error = %err, "failure screenshot unavailable");
                return None;
            }
        };
        let file_name = format!("{}.png", case.id);
        let path = dir.join(&file_name);
        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, bytes).await
        }
        .await;
        match written {
            Ok(()) => Some(relative_artifact_path(dir, &file_name)),
            Err(err) => {
                warn!(case = %case.id, path = %path.display(), error = %err, "failed to write failure screenshot");
                None
            }
        }
    }
}

/// Leading waits only delay the first real interaction after a fresh load.
pub fn cleaned_steps(steps: &[Step]) -> &[Step] {
    let first_real = steps
        .iter()
        .position(|step| step.kind() != ActionKind::Wait)
        .unwrap_or(steps.len());
    &steps[first_real..]
}

fn describe(step: &Step) -> String {
    match step.action.selector() {
        Some(selector) => format!("{} {selector}", step.kind()),
        None => step.kind().to_string(),
    }
}

fn relative_artifact_path(dir: &Path, file_name: &str) -> String {
    match dir.file_name() {
        Some(parent) => format!("{}/{file_name}", parent.to_string_lossy()),
        None => file_name.to_string(),
    }
}

struct StepFailure {
    step: Option<(usize, String)>,
    error: ActionError,
}

impl StepFailure {
    fn whole_case(error: ActionError) -> Self {
        Self { step: None, error }
    }

    fn details(&self) -> String {
        match &self.step {
            Some((number, what)) => format!("step {number} ({what}) failed: {}", self.error),
            None => self.error.to_string(),
        }
    }
}
