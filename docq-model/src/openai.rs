//! Client for OpenAI-compatible chat-completions endpoints.
//!
//! The wire format is the `/chat/completions` contract spoken by OpenAI,
//! Perplexity, vLLM, Ollama, and most hosted inference services. Request
//! and response bodies are typed serde structs; nothing in the response is
//! parsed ad hoc.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::completion::{Completion, CompletionModel, CompletionRequest, Usage};
use crate::error::{ModelError, Result};

/// Default endpoint: Perplexity's chat-completions API.
pub const DEFAULT_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";
/// Default model served at the default endpoint.
pub const DEFAULT_MODEL: &str = "sonar";

const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_TOKENS: u32 = 4000;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for a [`ChatCompletionsClient`].
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    /// Bearer token for the API.
    pub api_key: String,
    /// Full URL of the chat-completions endpoint.
    pub endpoint: String,
    /// Model name sent with every request.
    pub model: String,
    /// Default sampling temperature.
    pub temperature: f32,
    /// Default completion length cap.
    pub max_tokens: u32,
    /// Hard timeout for each HTTP request.
    pub timeout: Duration,
}

impl ChatClientConfig {
    /// Configuration for the default endpoint with standard settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Configuration for any OpenAI-compatible endpoint.
    pub fn compatible(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self { endpoint: endpoint.into(), model: model.into(), ..Self::new(api_key) }
    }

    /// Override the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the default sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the default completion length cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read configuration from the environment.
    ///
    /// `DOCQ_API_KEY` is required; `DOCQ_API_ENDPOINT` and `DOCQ_MODEL`
    /// fall back to the Perplexity defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("DOCQ_API_KEY")
            .map_err(|_| ModelError::Config("DOCQ_API_KEY is not set".to_string()))?;
        let mut config = Self::new(api_key);
        if let Ok(endpoint) = env::var("DOCQ_API_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Ok(model) = env::var("DOCQ_MODEL") {
            config.model = model;
        }
        Ok(config)
    }
}

/// A [`CompletionModel`] backed by an OpenAI-compatible HTTP endpoint.
#[derive(Debug)]
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    config: ChatClientConfig,
}

impl ChatCompletionsClient {
    /// Create a client, validating the configuration.
    ///
    /// # Errors
    ///
    /// [`ModelError::Config`] when the API key is empty or the underlying
    /// HTTP client cannot be constructed.
    pub fn new(config: ChatClientConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(ModelError::Config("API key must not be empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl CompletionModel for ChatCompletionsClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let payload = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.user },
            ],
            temperature: request.temperature.unwrap_or(self.config.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
        };

        debug!(model = %self.config.model, user_bytes = request.user.len(), "sending completion request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "completion API returned an error");
            return Err(ModelError::Api { status: status.as_u16(), body });
        }

        let parsed: ChatResponse =
            response.json().await.map_err(|e| ModelError::Protocol(e.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Protocol("response contained no choices".to_string()))?;

        Ok(Completion {
            text: choice.message.content,
            usage: parsed.usage,
            finish_reason: choice.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_to_chat_completions_shape() {
        let payload = ChatRequest {
            model: "sonar",
            messages: [
                ChatMessage { role: "system", content: "be terse" },
                ChatMessage { role: "user", content: "hello" },
            ],
            temperature: 0.2,
            max_tokens: 100,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["model"], "sonar");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hello");
        assert_eq!(value["max_tokens"], 100);
    }

    #[test]
    fn response_with_usage_deserializes() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "42"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "42");
        assert_eq!(parsed.usage.total_tokens, 15);
        assert_eq!(parsed.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn response_without_usage_defaults_to_zero() {
        let body = r#"{"choices": [{"message": {"content": "ok"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.usage, Usage::default());
        assert!(parsed.choices[0].finish_reason.is_none());
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = ChatCompletionsClient::new(ChatClientConfig::new("")).unwrap_err();
        assert!(matches!(err, ModelError::Config(_)));
    }
}
