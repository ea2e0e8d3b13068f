//! Configuration management
//!
//! One YAML document with a section per pipeline stage. Every field has a default so a
//! missing or partial file still yields a runnable configuration.

use std::env;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use action_primitives::ExecutionConfig;
use agent_core::openai::DEFAULT_API_BASE;
use agent_core::{GenerationConfig, OpenAiConfig};
use anyhow::{Context, Result};
use cdp_adapter::DriverConfig;
use serde::{Deserialize, Serialize};
use smokeprobe_core_types::SuccessRateBasis;
use tokio::fs;
use tracing::{info, warn};

pub const LOCAL_ENV_PATH: &str = "config/local.env";
pub const LOCAL_CONFIG_PATH: &str = "config/config.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSettings,
    pub generation: GenerationConfig,
    pub execution: ExecutionConfig,
    pub browser: BrowserSettings,
    pub report: ReportSettings,
}

/// Connection to the OpenAI-compatible generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Tried in order; a rate-limited key hands over to the next one.
    pub api_keys: Vec<String>,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            model: "gpt-4o-mini".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 120,
        }
    }
}

impl LlmSettings {
    pub fn openai_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            api_keys: self.api_keys.clone(),
            model: self.model.clone(),
            api_base: self.api_base.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    /// Record a screencast of the main tab into the run directory.
    pub record_video: bool,
    pub video_quality: u8,
    pub launch_timeout_ms: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        let driver = DriverConfig::default();
        Self {
            executable: driver.executable,
            headless: driver.headless,
            window_width: driver.window_width,
            window_height: driver.window_height,
            record_video: true,
            video_quality: driver.video_quality,
            launch_timeout_ms: driver.launch_timeout_ms,
        }
    }
}

impl BrowserSettings {
    /// Driver settings for one run; recordings go to `run_dir` when enabled.
    pub fn driver_config(&self, run_dir: &Path) -> DriverConfig {
        DriverConfig {
            executable: self.executable.clone(),
            headless: self.headless,
            window_width: self.window_width,
            window_height: self.window_height,
            video_dir: self.record_video.then(|| run_dir.to_path_buf()),
            video_quality: self.video_quality,
            launch_timeout_ms: self.launch_timeout_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Parent of the per-run artifact directories.
    pub output_dir: PathBuf,
    pub success_rate_basis: SuccessRateBasis,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            success_rate_basis: SuccessRateBasis::default(),
        }
    }
}

impl Config {
    /// Applies the `SMOKEPROBE_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    /// Applies overrides resolved through `lookup`; blank values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(keys) = get("SMOKEPROBE_LLM_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            self.llm.api_keys = keys
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(base) = get("SMOKEPROBE_LLM_BASE") {
            self.llm.api_base = base;
        }
        if let Some(model) = get("SMOKEPROBE_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(dir) = get("SMOKEPROBE_OUTPUT_DIR") {
            self.report.output_dir = PathBuf::from(dir);
        }
        if let Some(chrome) = get("SMOKEPROBE_CHROME") {
            self.browser.executable = Some(PathBuf::from(chrome));
        }
    }
}

pub struct LoadedConfig {
    pub config: Config,
    /// File the configuration came from; `None` when defaults were used.
    pub path: Option<PathBuf>,
}

/// Resolves the configuration file: explicit path, then `config/config.yaml`, then the
/// user config directory. Falls back to defaults when none exists.
pub async fn load_config(config_path: Option<&Path>) -> Result<LoadedConfig> {
    let candidates: Vec<PathBuf> = match config_path {
        Some(path) => vec![path.to_path_buf()],
        None => {
            let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_PATH)];
            if let Some(mut path) = dirs::config_dir() {
                path.push("smokeprobe");
                path.push("config.yaml");
                candidates.push(path);
            }
            candidates
        }
    };

    let Some(path) = candidates.into_iter().find(|path| path.exists()) else {
        if let Some(path) = config_path {
            warn!("Config file not found, using defaults: {}", path.display());
        } else {
            info!("No configuration file found, using defaults");
        }
        return Ok(LoadedConfig {
            config: Config::default(),
            path: None,
        });
    };

    let content = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = if content.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?
    };

    info!("Loaded configuration from: {}", path.display());
    Ok(LoadedConfig {
        config,
        path: Some(path),
    })
}

/// Exports `KEY=VALUE` lines from `path` into the environment without overwriting
/// variables that are already set. Returns how many were applied.
pub fn load_local_env_overrides(path: &Path) -> usize {
    if !path.exists() {
        return 0;
    }

    match stdfs::read_to_string(path) {
        Ok(contents) => {
            let mut applied = 0;
            for (idx, raw_line) in contents.lines().enumerate() {
                let line = raw_line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let line = line.strip_prefix("export ").unwrap_or(line);
                let Some((key, value)) = line.split_once('=') else {
                    warn!(line = idx + 1, "invalid local.env entry; skipping");
                    continue;
                };
                let key = key.trim();
                if key.is_empty() || env::var(key).is_ok() {
                    continue;
                }
                env::set_var(key, unquote(value.trim()));
                applied += 1;
            }
            info!(path = %path.display(), applied, "Loaded environment overrides from local.env");
            applied
        }
        Err(err) => {
            warn!(path = %path.display(), ?err, "failed to read local.env overrides");
            0
        }
    }
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len() - 1]
            .replace("\\\"", "\"")
            .replace("\\n", "\n")
            .replace("\\t", "\t")
    } else if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}
