//! Error types for the `docq-engine` crate.

use thiserror::Error;

/// Errors surfaced by the question answering engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The extraction-stage completion call failed; there is nothing to
    /// summarize, so the question fails as a whole.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// A question was asked about an identity that was never indexed
    /// through this engine (and has no cache entry to restore from).
    #[error("No indexed document for identity '{0}'")]
    NotIndexed(String),

    /// A configuration error.
    #[error("Engine configuration error: {0}")]
    Config(String),

    /// An error propagated from the retrieval core.
    #[error(transparent)]
    Rag(#[from] docq_rag::RagError),
}

/// A convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
