//! Run directory layout and artifact finalisation.
//!
//! ```text
//! <output_dir>/<run_id>/
//!   report.json
//!   recording.mjpeg
//!   screenshots/TC-003.png
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cdp_adapter::VIDEO_EXTENSION;
use smokeprobe_core_types::{RunId, RunReport};
use tokio::fs;
use tracing::{debug, info, warn};

pub const REPORT_FILE: &str = "report.json";
pub const SCREENSHOT_DIR: &str = "screenshots";

pub fn recording_file_name() -> String {
    format!("recording.{VIDEO_EXTENSION}")
}

pub async fn prepare_run_dir(output_dir: &Path, run_id: &RunId) -> Result<PathBuf> {
    let dir = output_dir.join(run_id.to_string());
    fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("failed to create run directory {}", dir.display()))?;
    Ok(dir)
}

pub async fn write_report(run_dir: &Path, report: &RunReport) -> Result<PathBuf> {
    let path = run_dir.join(REPORT_FILE);
    let body = serde_json::to_string_pretty(report).context("failed to serialize run report")?;
    fs::write(&path, body)
        .await
        .with_context(|| format!("failed to write report {}", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(path)
}

pub async fn load_report(path: &Path) -> Result<RunReport> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read report {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse report {}", path.display()))
}

/// Keeps the largest recording in `run_dir` as `recording.mjpeg` and removes the others.
///
/// Every page that was recorded leaves its own file behind; the main tab's is the longest.
pub async fn finalize_video(run_dir: &Path) -> Result<Option<PathBuf>> {
    let mut recordings = Vec::new();
    let mut entries = match fs::read_dir(run_dir).await {
        Ok(entries) => entries,
        Err(err) => {
            debug!(?err, dir = %run_dir.display(), "no run directory to scan for recordings");
            return Ok(None);
        }
    };
    while let Some(entry) = entries
        .next_entry()
        .await
        .context("failed to list recordings")?
    {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(VIDEO_EXTENSION) {
            continue;
        }
        let size = entry.metadata().await.map(|meta| meta.len()).unwrap_or(0);
        recordings.push((size, path));
    }

    // Largest first; ties resolved by path so the choice is stable.
    recordings.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    let mut recordings = recordings.into_iter();
    let Some((size, largest)) = recordings.next() else {
        return Ok(None);
    };

    for (_, leftover) in recordings {
        if let Err(err) = fs::remove_file(&leftover).await {
            warn!(?err, path = %leftover.display(), "failed to remove extra recording");
        }
    }

    let target = run_dir.join(recording_file_name());
    if largest != target {
        fs::rename(&largest, &target)
            .await
            .with_context(|| format!("failed to rename recording {}", largest.display()))?;
    }
    info!(path = %target.display(), bytes = size, "recording finalized");
    Ok(Some(target))
}
