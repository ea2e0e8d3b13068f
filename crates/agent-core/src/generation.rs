use std::sync::Arc;

use serde_json::Value;
use smokeprobe_core_types::{CandidateCase, TokenUsage};
use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::json::extract_json_array;
use crate::llm_provider::{CompletionRequest, LlmProvider};

/// Calls the model and turns its answer into candidate cases. Never fails: transport and
/// parse problems yield an empty batch so the caller can simply try again.
pub struct GenerationClient {
    provider: Arc<dyn LlmProvider>,
    config: GenerationConfig,
    usage: TokenUsage,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn LlmProvider>, config: GenerationConfig) -> Self {
        Self {
            provider,
            config,
            usage: TokenUsage::default(),
        }
    }

    /// Token usage accumulated over every successful call.
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub async fn invoke(&mut self, prompt: &str, attempt: usize) -> Vec<CandidateCase> {
        let request = CompletionRequest {
            prompt: prompt.to_string(),
            temperature: self.config.temperature_for(attempt),
            max_tokens: self.config.max_tokens,
        };
        debug!(
            provider = self.provider.name(),
            attempt,
            temperature = request.temperature,
            prompt_chars = prompt.chars().count(),
            "requesting test cases"
        );

        let completion = match self.provider.complete(&request).await {
            Ok(completion) => completion,
            Err(err) => {
                warn!(provider = self.provider.name(), attempt, error = %err, "generation call failed");
                return Vec::new();
            }
        };
        self.usage.add(completion.usage);

        let Some(items) = extract_json_array(&completion.text) else {
            warn!(
                attempt,
                response_chars = completion.text.chars().count(),
                "generation response held no JSON array"
            );
            return Vec::new();
        };

        let total = items.len();
        let candidates: Vec<CandidateCase> = items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        if candidates.len() < total {
            debug!(
                dropped = total - candidates.len(),
                "dropped non-object entries from generation response"
            );
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_provider::ScriptedLlmProvider;

    fn client(provider: ScriptedLlmProvider) -> (Arc<ScriptedLlmProvider>, GenerationClient) {
        let provider = Arc::new(provider);
        let client = GenerationClient::new(provider.clone(), GenerationConfig::default());
        (provider, client)
    }

    #[tokio::test]
    async fn parses_fenced_answer_and_drops_non_objects() {
        let answer = "```json\n[{\"title\": \"a\", \"steps\": []}, 42, \"x\", {\"title\": \"b\"}]\n```";
        let (_, mut client) = client(ScriptedLlmProvider::new([answer]));
        let cases = client.invoke("prompt", 0).await;
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[1].title_text(), "b");
    }

    #[tokio::test]
    async fn failures_become_empty_batches() {
        let (_, mut client) = client(
            ScriptedLlmProvider::new(Vec::<String>::new())
                .then_fail("connection reset")
                .then_respond("sorry, no JSON today"),
        );
        assert!(client.invoke("p", 0).await.is_empty());
        assert!(client.invoke("p", 1).await.is_empty());
    }

    #[tokio::test]
    async fn usage_accumulates_and_temperature_rises() {
        let (provider, mut client) = client(ScriptedLlmProvider::repeating("[]"));
        client.invoke("abcd", 0).await;
        client.invoke("abcd", 3).await;
        assert_eq!(client.usage().prompt_tokens, 2);
        assert_eq!(client.usage().completion_tokens, 2);

        let requests = provider.requests().await;
        assert!(requests[1].temperature > requests[0].temperature);
        assert_eq!(requests[0].max_tokens, GenerationConfig::default().max_tokens);
    }
}
