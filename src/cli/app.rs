use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use agent_core::{AgentError, LlmProvider, OpenAiLlmProvider, ScriptedLlmProvider};
use cdp_adapter::ChromiumDriver;
use smokeprobe_cli::artifacts::prepare_run_dir;
use smokeprobe_cli::config::{load_config, load_local_env_overrides, Config, LoadedConfig, LOCAL_ENV_PATH};
use smokeprobe_cli::session::{write_fatal_report, RunRequest, SessionController, SessionOutcome};
use smokeprobe_core_types::RunId;

use super::env::CliArgs;
use super::output::{print_human, print_json};
use super::runtime::init_logging;

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();
    init_logging(&cli.log_level, cli.debug)?;
    load_local_env_overrides(Path::new(LOCAL_ENV_PATH));

    info!("Starting SmokeProbe v{}", env!("CARGO_PKG_VERSION"));

    let LoadedConfig { mut config, path } = load_config(cli.config.as_deref()).await?;
    config.apply_env_overrides();
    if let Some(dir) = &cli.output_dir {
        config.report.output_dir = dir.clone();
    }
    if cli.headful {
        config.browser.headless = false;
    }
    if let Some(path) = path {
        info!(path = %path.display(), "configuration in effect");
    }

    let run_id = RunId::new();
    let run_dir = prepare_run_dir(&config.report.output_dir, &run_id).await?;
    let request = RunRequest {
        run_id,
        url: cli.url.clone(),
        count: cli.count,
        run_dir,
    };

    match execute(&cli, &config, &request).await {
        Ok(outcome) => {
            if cli.json {
                print_json(&outcome)?;
            } else {
                print_human(&outcome);
            }
            info!("Run completed");
            Ok(())
        }
        Err(err) => {
            error!("Run failed: {:#}", err);
            Err(err)
        }
    }
}

async fn execute(cli: &CliArgs, config: &Config, request: &RunRequest) -> Result<SessionOutcome> {
    let provider = match build_provider(cli, config).await {
        Ok(provider) => provider,
        Err(err) => return write_fatal_report(request, config, err.to_string()).await,
    };

    let driver = match ChromiumDriver::launch(config.browser.driver_config(&request.run_dir)).await
    {
        Ok(driver) => driver,
        Err(err) => {
            return write_fatal_report(request, config, format!("failed to launch browser: {err}"))
                .await
        }
    };

    SessionController::new(Arc::new(driver), provider, config.clone())
        .run(request)
        .await
}

async fn build_provider(cli: &CliArgs, config: &Config) -> Result<Arc<dyn LlmProvider>, AgentError> {
    match &cli.offline {
        Some(path) => {
            info!(path = %path.display(), "offline mode: serving canned generation answers");
            Ok(Arc::new(ScriptedLlmProvider::from_file(path).await?))
        }
        None => Ok(Arc::new(OpenAiLlmProvider::new(config.llm.openai_config())?)),
    }
}
