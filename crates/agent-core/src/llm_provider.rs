use std::collections::VecDeque;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use smokeprobe_core_types::TokenUsage;
use tokio::sync::Mutex;

use crate::errors::AgentError;

/// One text-generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Raw model answer plus what it cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

/// Abstraction over text-generation services so vendors and test doubles are interchangeable.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short vendor label used in logs.
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AgentError>;
}

/// Deterministic provider used for tests and offline dry runs.
///
/// Serves queued answers in order; once the queue is empty every call gets the fallback
/// answer (`[]` unless configured otherwise). Usage is estimated at four characters per token.
#[derive(Debug)]
pub struct ScriptedLlmProvider {
    queue: Mutex<VecDeque<Result<String, String>>>,
    fallback: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl Default for ScriptedLlmProvider {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

impl ScriptedLlmProvider {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            fallback: "[]".to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers every call with the same text.
    pub fn repeating(text: impl Into<String>) -> Self {
        Self::default().with_fallback(text)
    }

    /// Reads a canned answer from disk and serves it on every call.
    pub async fn from_file(path: &Path) -> Result<Self, AgentError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|err| {
            AgentError::invalid_config(format!("cannot read {}: {err}", path.display()))
        })?;
        Ok(Self::repeating(text))
    }

    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }

    /// Queues a failing call after the answers queued so far.
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.queue.get_mut().push_back(Err(message.into()));
        self
    }

    /// Queues another answer after the ones queued so far.
    pub fn then_respond(mut self, text: impl Into<String>) -> Self {
        self.queue.get_mut().push_back(Ok(text.into()));
        self
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlmProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AgentError> {
        self.requests.lock().await.push(request.clone());
        let next = self
            .queue
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()));
        let text = next.map_err(AgentError::Scripted)?;
        let usage = TokenUsage::new(estimate_tokens(&request.prompt), estimate_tokens(&text));
        Ok(Completion { text, usage })
    }
}

fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest {
            prompt: prompt.to_string(),
            temperature: 0.5,
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn serves_queue_then_fallback() {
        let provider = ScriptedLlmProvider::new(["first"]).then_fail("boom");
        assert_eq!(provider.complete(&request("a")).await.unwrap().text, "first");
        assert!(matches!(
            provider.complete(&request("b")).await,
            Err(AgentError::Scripted(msg)) if msg == "boom"
        ));
        assert_eq!(provider.complete(&request("c")).await.unwrap().text, "[]");
        assert_eq!(provider.requests().await.len(), 3);
    }

    #[tokio::test]
    async fn usage_is_estimated_from_lengths() {
        let provider = ScriptedLlmProvider::repeating("12345678");
        let completion = provider.complete(&request("abcde")).await.unwrap();
        assert_eq!(completion.usage, TokenUsage::new(2, 2));
        assert_eq!(completion.usage.total_tokens, 4);
    }

    #[tokio::test]
    async fn from_file_repeats_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.json");
        std::fs::write(&path, "[{\"title\":\"t\"}]").unwrap();
        let provider = ScriptedLlmProvider::from_file(&path).await.unwrap();
        for _ in 0..2 {
            let text = provider.complete(&request("p")).await.unwrap().text;
            assert_eq!(text, "[{\"title\":\"t\"}]");
        }
    }
}
