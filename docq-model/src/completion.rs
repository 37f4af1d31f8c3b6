//! The completion trait and its request/response types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Token accounting for a single completion call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Usage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the completion.
    pub completion_tokens: u32,
    /// Total billed tokens.
    pub total_tokens: u32,
}

/// A single completion request: system instruction plus user message.
///
/// `temperature` and `max_tokens` override the client's configured defaults
/// when set.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// The system instruction framing the call.
    pub system: String,
    /// The user message.
    pub user: String,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
    /// Completion length cap override.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a request with no overrides.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self { system: system.into(), user: user.into(), temperature: None, max_tokens: None }
    }

    /// Override the sampling temperature for this request.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Override the completion length cap for this request.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// The typed result of a completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text.
    pub text: String,
    /// Token accounting for this call.
    pub usage: Usage,
    /// Why generation stopped, when the backend reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// An external language-model backend.
///
/// Implementations are expected to bound every call with a timeout; a hung
/// request must fail, not stall the pipeline.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// The model name, used for attribution in answer records.
    fn name(&self) -> &str;

    /// Run one completion call.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;
}
