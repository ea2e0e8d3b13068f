//! Tunables for the generation pipeline.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Upper bound on cases requested per model call.
    /// Default: 10
    pub batch_size: usize,

    /// Model calls allowed before the refill loop gives up.
    /// Default: 10
    pub max_attempts: usize,

    /// Sampling temperature of the first call.
    /// Default: 0.7
    pub base_temperature: f32,

    /// Added to the temperature on every further attempt, capped at 1.0.
    /// Default: 0.05
    pub temperature_step: f32,

    /// Completion token limit per call.
    /// Default: 8192
    pub max_tokens: u32,

    /// Character budget of the page context embedded in every prompt.
    /// Default: 30000
    pub context_max_chars: usize,

    /// Language the model writes titles and descriptions in.
    /// Default: Korean
    pub language: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_attempts: 10,
            base_temperature: 0.7,
            temperature_step: 0.05,
            max_tokens: 8192,
            context_max_chars: 30_000,
            language: "Korean".to_string(),
        }
    }
}

impl GenerationConfig {
    /// Temperature for the zero-based `attempt`.
    pub fn temperature_for(&self, attempt: usize) -> f32 {
        (self.base_temperature + self.temperature_step * attempt as f32).min(1.0)
    }
}
