use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use smokeprobe_core_types::TokenUsage;
use tracing::{debug, warn};

use crate::errors::AgentError;
use crate::llm_provider::{Completion, CompletionRequest, LlmProvider};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Keys tried in order; a 429 on one key moves on to the next.
    pub api_keys: Vec<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

/// Provider for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiLlmProvider {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiLlmProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, AgentError> {
        if config.api_keys.is_empty() {
            return Err(AgentError::invalid_config(
                "missing API key for the generation service",
            ));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| {
                AgentError::invalid_config(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl LlmProvider for OpenAiLlmProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AgentError> {
        let url = self.endpoint();
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
        };

        let mut last_error: Option<AgentError> = None;
        for (index, key) in self.config.api_keys.iter().enumerate() {
            let response = match self.client.post(&url).bearer_auth(key).json(&body).send().await
            {
                Ok(resp) => resp,
                Err(err) => {
                    last_error = Some(AgentError::transport(err.to_string()));
                    continue;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<response unavailable>".to_string());
                if status.as_u16() == 429 {
                    let friendly = rate_limit_message(&text);
                    warn!(
                        target: "openai",
                        message = %friendly,
                        attempt = index + 1,
                        remaining = self.config.api_keys.len() - index - 1,
                        "generation request rate limited; switching API key"
                    );
                    last_error = Some(AgentError::RateLimited(friendly));
                    continue;
                }
                return Err(AgentError::Http {
                    status: status.as_u16(),
                    body: text,
                });
            }

            let response: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|err| AgentError::malformed(err.to_string()))?;
            let completion = completion_from_response(response)?;
            debug!(
                target: "openai",
                model = %self.config.model,
                prompt_tokens = completion.usage.prompt_tokens,
                completion_tokens = completion.usage.completion_tokens,
                "generation request completed"
            );
            return Ok(completion);
        }

        Err(last_error
            .unwrap_or_else(|| AgentError::transport("request exhausted all API keys")))
    }
}

fn completion_from_response(response: ChatCompletionResponse) -> Result<Completion, AgentError> {
    let text = response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_ref())
        .and_then(ChatCompletionContent::as_text)
        .ok_or_else(|| AgentError::malformed("response missing content"))?;
    let usage = response
        .usage
        .map(|usage| TokenUsage::new(usage.prompt_tokens, usage.completion_tokens))
        .unwrap_or_default();
    Ok(Completion { text, usage })
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<ChatCompletionContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatCompletionContent {
    Text(String),
    Parts(Vec<ChatCompletionPart>),
}

impl ChatCompletionContent {
    fn as_text(&self) -> Option<String> {
        match self {
            ChatCompletionContent::Text(value) => Some(value.clone()),
            ChatCompletionContent::Parts(parts) => {
                let text = parts
                    .iter()
                    .filter_map(|part| part.text.as_ref())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("\n");
                (!text.is_empty()).then_some(text)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: Option<String>,
}

fn rate_limit_message(raw: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(raw) {
        if let Some(message) = envelope.error.message {
            return format!("rate limit exceeded: {}", message.trim());
        }
    }
    "rate limit exceeded; retry later or reduce usage".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_keys() {
        let result = OpenAiLlmProvider::new(OpenAiConfig {
            api_keys: Vec::new(),
            model: "gpt-4o-mini".into(),
            api_base: DEFAULT_API_BASE.into(),
            timeout: Duration::from_secs(5),
        });
        assert!(matches!(result, Err(AgentError::InvalidConfig(_))));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let provider = OpenAiLlmProvider::new(OpenAiConfig {
            api_keys: vec!["k".into()],
            model: "m".into(),
            api_base: "http://localhost:8080/v1/".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn parses_text_and_usage() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"[]"}}],
                "usage":{"prompt_tokens":12,"completion_tokens":3,"total_tokens":15}}"#,
        )
        .unwrap();
        let completion = completion_from_response(response).unwrap();
        assert_eq!(completion.text, "[]");
        assert_eq!(completion.usage, TokenUsage::new(12, 3));
    }

    #[test]
    fn joins_content_parts() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":[{"type":"text","text":"["},{"type":"text","text":"]"}]}}]}"#,
        )
        .unwrap();
        let completion = completion_from_response(response).unwrap();
        assert_eq!(completion.text, "[\n]");
        assert_eq!(completion.usage, TokenUsage::default());
    }

    #[test]
    fn missing_content_is_malformed() {
        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(matches!(
            completion_from_response(response),
            Err(AgentError::MalformedResponse(_))
        ));
    }

    #[test]
    fn rate_limit_message_prefers_service_text() {
        let raw = r#"{"error":{"message":"  Too many requests ","type":"requests"}}"#;
        assert_eq!(rate_limit_message(raw), "rate limit exceeded: Too many requests");
        assert!(rate_limit_message("nope").starts_with("rate limit exceeded;"));
    }
}
