//! Error types for the `docq-model` crate.

use thiserror::Error;

/// Errors produced by completion backends.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The request never produced an HTTP response (connect failure,
    /// timeout, TLS error).
    #[error("Completion transport error: {0}")]
    Transport(String),

    /// The API answered with a non-success status.
    #[error("Completion API returned status {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response arrived but did not match the expected wire contract.
    #[error("Malformed completion response: {0}")]
    Protocol(String),

    /// Client construction or configuration failure.
    #[error("Model configuration error: {0}")]
    Config(String),
}

/// A convenience result type for completion operations.
pub type Result<T> = std::result::Result<T, ModelError>;
