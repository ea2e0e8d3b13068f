use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};
use which::which;

/// Configuration for launching the Chromium driver.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Explicit Chromium binary; detected from `SMOKEPROBE_CHROME`, `PATH` and OS defaults when unset.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    /// Directory receiving screencast recordings; recording is disabled when `None`.
    pub video_dir: Option<PathBuf>,
    /// JPEG quality of recorded screencast frames (0-100).
    pub video_quality: u8,
    pub launch_timeout_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            window_width: 1280,
            window_height: 720,
            video_dir: None,
            video_quality: 60,
            launch_timeout_ms: 20_000,
        }
    }
}

impl DriverConfig {
    pub fn resolved_executable(&self) -> Option<PathBuf> {
        self.executable
            .clone()
            .filter(|path| path.exists())
            .or_else(detect_chrome_executable)
    }
}

pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("SMOKEPROBE_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    os_specific_chrome_paths()
        .into_iter()
        .find(|candidate| candidate.exists())
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(target_os = "windows")]
    {
        ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"]
            .iter()
            .filter_map(|key| env::var(key).ok())
            .map(|root| PathBuf::from(root).join("Google/Chrome/Application/chrome.exe"))
            .collect()
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/snap/bin/chromium"),
        ]
    }
}
