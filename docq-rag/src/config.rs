//! Configuration for the retrieval core.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Which chunking strategy [`chunker_for`](crate::chunking::chunker_for) builds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Split at natural boundaries (paragraph, line, sentence, word) first.
    #[default]
    Recursive,
    /// Fixed stride window with an exact overlap guarantee.
    Sliding,
}

/// Configuration parameters for chunking and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in bytes (split at character boundaries).
    pub chunk_size: usize,
    /// Overlap carried between consecutive chunks.
    pub chunk_overlap: usize,
    /// Default number of chunks to retrieve per query.
    pub top_k: usize,
    /// Chunking strategy to use when building indexes.
    pub strategy: ChunkStrategy,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { chunk_size: 1200, chunk_overlap: 200, top_k: 5, strategy: ChunkStrategy::Recursive }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the default number of results per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the chunking strategy.
    pub fn strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accepts_consistent_parameters() {
        let config = RagConfig::builder()
            .chunk_size(600)
            .chunk_overlap(100)
            .top_k(3)
            .strategy(ChunkStrategy::Sliding)
            .build()
            .unwrap();
        assert_eq!(config.chunk_size, 600);
        assert_eq!(config.strategy, ChunkStrategy::Sliding);
    }

    #[test]
    fn builder_rejects_overlap_not_smaller_than_size() {
        let err = RagConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn builder_rejects_zero_chunk_size_and_top_k() {
        assert!(RagConfig::builder().chunk_size(0).build().is_err());
        assert!(RagConfig::builder().top_k(0).build().is_err());
    }
}
