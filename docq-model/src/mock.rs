//! Scripted completion model for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::completion::{Completion, CompletionModel, CompletionRequest, Usage};
use crate::error::{ModelError, Result};

enum Scripted {
    Reply(String),
    Fail(String),
}

/// A [`CompletionModel`] that replays a scripted sequence of outcomes.
///
/// Each call consumes the next script entry; once the script is exhausted,
/// calls echo the user message. Every request is recorded and can be
/// inspected with [`requests`](MockModel::requests).
///
/// ```rust,ignore
/// let model = MockModel::new()
///     .reply("first answer")
///     .fail("backend down")
///     .reply("third answer");
/// ```
pub struct MockModel {
    name: String,
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockModel {
    /// Create an empty-scripted mock named `mock`.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Append a successful reply to the script.
    pub fn reply(mut self, text: impl Into<String>) -> Self {
        self.script.get_mut().push_back(Scripted::Reply(text.into()));
        self
    }

    /// Append a transport failure to the script.
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.script.get_mut().push_back(Scripted::Fail(message.into()));
        self
    }

    /// All requests seen so far, in call order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

fn canned_usage() -> Usage {
    Usage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 }
}

#[async_trait]
impl CompletionModel for MockModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let scripted = self.script.lock().await.pop_front();
        self.requests.lock().await.push(request.clone());
        match scripted {
            Some(Scripted::Reply(text)) => Ok(Completion {
                text,
                usage: canned_usage(),
                finish_reason: Some("stop".to_string()),
            }),
            Some(Scripted::Fail(message)) => Err(ModelError::Transport(message)),
            None => Ok(Completion {
                text: format!("echo: {}", request.user),
                usage: canned_usage(),
                finish_reason: Some("stop".to_string()),
            }),
        }
    }
}
