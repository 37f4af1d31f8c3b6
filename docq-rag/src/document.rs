//! Data types for documents, chunks, and retrieval results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source document containing extracted text and metadata.
///
/// The `id` doubles as the document identity used for cache keys: callers
/// must pick an identity that is stable for unchanged source text and unique
/// enough across different documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Stable identity of the document.
    pub id: String,
    /// The full extracted text of the document.
    pub text: String,
    /// Key-value metadata (title, author, page count, ...).
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new() }
    }
}

/// A bounded segment of a [`Document`], the unit of retrieval.
///
/// Chunks are immutable once produced by a chunker. `position` is the
/// chunker-assigned ordinal within the document; retrieval uses it to break
/// score ties deterministically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier, `{document_id}_{position}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text. Empty until indexing.
    pub embedding: Vec<f32>,
    /// Ordinal of this chunk within its document.
    pub position: usize,
    /// Metadata inherited from the parent document plus chunk-specific fields.
    pub metadata: HashMap<String, String>,
    /// The identity of the parent [`Document`].
    pub document_id: String,
}

/// A retrieved [`Chunk`] paired with its similarity score.
///
/// Produced fresh per query and never persisted. Scores are cosine
/// similarity: higher is more relevant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity between the query and the chunk.
    pub score: f32,
}
