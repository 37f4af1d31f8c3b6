//! # docq-model
//!
//! The completion-service boundary for docq. Everything upstream of this
//! crate talks to a language model exclusively through [`CompletionModel`]:
//! one system instruction, one user message, one typed [`Completion`] back
//! with per-call [`Usage`] accounting.
//!
//! Provided implementations:
//!
//! - [`ChatCompletionsClient`] — any OpenAI-compatible chat-completions
//!   endpoint (Perplexity, OpenAI, vLLM, Ollama, ...)
//! - [`MockModel`] — scripted replies and failure injection for tests
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use docq_model::{ChatClientConfig, ChatCompletionsClient, CompletionModel, CompletionRequest};
//!
//! let client = ChatCompletionsClient::new(ChatClientConfig::from_env()?)?;
//! let completion = client
//!     .complete(CompletionRequest::new("You extract facts.", "What is the total?"))
//!     .await?;
//! println!("{} ({} tokens)", completion.text, completion.usage.total_tokens);
//! ```

mod completion;
mod error;
pub mod mock;
pub mod openai;

pub use completion::{Completion, CompletionModel, CompletionRequest, Usage};
pub use error::{ModelError, Result};
pub use mock::MockModel;
pub use openai::{ChatClientConfig, ChatCompletionsClient};
