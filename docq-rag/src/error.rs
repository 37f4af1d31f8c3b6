//! Error types for the `docq-rag` crate.

use thiserror::Error;

/// Errors that can occur while indexing, retrieving, or caching.
#[derive(Debug, Error)]
pub enum RagError {
    /// Chunking or embedding failed while building a document index.
    ///
    /// Fatal for the whole document: no partial index is ever exposed.
    #[error("Indexing failed for document '{document_id}': {message}")]
    Indexing {
        /// The document that failed to index.
        document_id: String,
        /// A description of the failure.
        message: String,
    },

    /// Retrieval was attempted against an index with no chunks.
    #[error("Index for document '{0}' contains no chunks")]
    EmptyIndex(String),

    /// A cache entry exists but could not be deserialized.
    ///
    /// Recoverable by rebuilding with `force_reindex`; the cache never
    /// silently falls back to a rebuild on its own.
    #[error("Cache entry for '{identity}' could not be read: {message}")]
    CacheRead {
        /// The document identity whose entry is corrupt or incompatible.
        identity: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O failure in the cache's storage backend.
    #[error("Cache storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// A convenience result type for retrieval-core operations.
pub type Result<T> = std::result::Result<T, RagError>;
