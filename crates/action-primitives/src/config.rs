use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeouts and presentation settings of the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Budget of every selector-based action.
    pub action_timeout_ms: u64,
    /// How long `clickNewTab` waits for the tab to open and load.
    pub new_tab_timeout_ms: u64,
    /// Budget of the per-case reload.
    pub navigation_timeout_ms: u64,
    /// How long a highlighted element stays outlined.
    pub highlight_ms: u64,
    /// Upper bound of a single `wait` step; longer model-supplied pauses are clamped.
    pub max_wait_ms: u64,
    pub screenshot_on_failure: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            action_timeout_ms: 5_000,
            new_tab_timeout_ms: 10_000,
            navigation_timeout_ms: 30_000,
            highlight_ms: 300,
            max_wait_ms: 10_000,
            screenshot_on_failure: true,
        }
    }
}

impl ExecutionConfig {
    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    pub fn new_tab_timeout(&self) -> Duration {
        Duration::from_millis(self.new_tab_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn highlight_pause(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    pub fn wait_duration(&self, requested_ms: u64) -> Duration {
        Duration::from_millis(requested_ms.min(self.max_wait_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_duration_is_capped() {
        let config = ExecutionConfig::default();
        assert_eq!(config.wait_duration(1_500), Duration::from_millis(1_500));
        assert_eq!(config.wait_duration(86_400_000), Duration::from_millis(10_000));
    }
}
