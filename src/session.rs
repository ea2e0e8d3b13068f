//! One end-to-end run: load the page, generate cases, execute them, persist the report.

use std::path::PathBuf;
use std::sync::Arc;

use action_primitives::ActionExecutor;
use agent_core::{CaseValidator, GenerationClient, LlmProvider, PromptBuilder, RefillLoop};
use anyhow::Result;
use cdp_adapter::BrowserDriver;
use perceiver_structural::{DomSummarizer, StructuralPerceiver};
use smokeprobe_core_types::{PageContext, RunId, RunReport};
use tracing::{info, warn};

use crate::artifacts::{finalize_video, write_report, SCREENSHOT_DIR};
use crate::config::Config;
use crate::report::ResultRecorder;

/// What to test and where the artifacts go.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub run_id: RunId,
    pub url: String,
    /// Number of test cases to generate.
    pub count: usize,
    /// Existing directory receiving the report, screenshots and recording.
    pub run_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub report: RunReport,
    pub report_path: PathBuf,
    pub video: Option<PathBuf>,
}

/// Drives a run over a browser it owns exclusively for the duration of [`SessionController::run`].
pub struct SessionController {
    driver: Arc<dyn BrowserDriver>,
    provider: Arc<dyn LlmProvider>,
    perceiver: Box<dyn StructuralPerceiver>,
    config: Config,
}

impl SessionController {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        provider: Arc<dyn LlmProvider>,
        config: Config,
    ) -> Self {
        Self {
            driver,
            provider,
            perceiver: Box::new(DomSummarizer::default()),
            config,
        }
    }

    pub fn with_perceiver(mut self, perceiver: Box<dyn StructuralPerceiver>) -> Self {
        self.perceiver = perceiver;
        self
    }

    /// Runs the whole pipeline and always writes a report; the only error is failing to
    /// persist it. The browser is shut down before the recording is finalized.
    pub async fn run(&self, request: &RunRequest) -> Result<SessionOutcome> {
        info!(
            run = %request.run_id,
            url = %request.url,
            count = request.count,
            provider = self.provider.name(),
            "starting run"
        );
        let mut recorder = ResultRecorder::new(
            request.run_id.clone(),
            request.url.clone(),
            self.config.report.success_rate_basis,
        );

        match self.load_context(&request.url).await {
            Ok(context) => self.generate_and_execute(request, &context, &mut recorder).await,
            Err(message) => recorder.fail_run(message),
        }

        if let Err(err) = self.driver.shutdown().await {
            warn!(error = %err, "browser shutdown reported an error");
        }

        let report = recorder.finish();
        let report_path = write_report(&request.run_dir, &report).await?;
        let video = match finalize_video(&request.run_dir).await {
            Ok(video) => video,
            Err(err) => {
                warn!(error = %err, "failed to finalize recording");
                None
            }
        };

        info!(
            run = %request.run_id,
            total = report.summary.total,
            passed = report.summary.passed,
            success_rate = report.summary.success_rate,
            fatal = report.error.is_some(),
            "run finished"
        );
        Ok(SessionOutcome {
            report,
            report_path,
            video,
        })
    }

    async fn load_context(&self, url: &str) -> Result<PageContext, String> {
        self.driver
            .navigate(url, self.config.execution.navigation_timeout())
            .await
            .map_err(|err| err.to_string())?;
        let context = self
            .perceiver
            .summarize(
                self.driver.as_ref(),
                self.config.generation.context_max_chars,
            )
            .await
            .map_err(|err| format!("failed to read page structure: {err}"))?;
        info!(chars = context.char_len(), "page context ready");
        Ok(context)
    }

    async fn generate_and_execute(
        &self,
        request: &RunRequest,
        context: &PageContext,
        recorder: &mut ResultRecorder,
    ) {
        let generation = &self.config.generation;
        let mut refill = RefillLoop::new(
            PromptBuilder::new(generation.language.clone()),
            GenerationClient::new(self.provider.clone(), generation.clone()),
            CaseValidator::new(),
            generation.batch_size,
            generation.max_attempts,
        );
        let outcome = refill.generate(context, request.count).await;
        recorder.set_usage(outcome.usage);
        recorder.set_warning(outcome.warning(request.count));

        let executor = ActionExecutor::new(
            self.driver.clone(),
            request.url.clone(),
            self.config.execution.clone(),
        )
        .with_screenshot_dir(request.run_dir.join(SCREENSHOT_DIR));
        for case in &outcome.cases {
            recorder.record(executor.run(case).await);
        }
    }
}

/// Persists a report for a run that could not even start, e.g. when the browser failed
/// to launch.
pub async fn write_fatal_report(
    request: &RunRequest,
    config: &Config,
    error: impl AsRef<str>,
) -> Result<SessionOutcome> {
    let mut recorder = ResultRecorder::new(
        request.run_id.clone(),
        request.url.clone(),
        config.report.success_rate_basis,
    );
    recorder.fail_run(error);
    let report = recorder.finish();
    let report_path = write_report(&request.run_dir, &report).await?;
    Ok(SessionOutcome {
        report,
        report_path,
        video: None,
    })
}
