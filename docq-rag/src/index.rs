//! Document indexes: one document's chunks plus the vector store that
//! answers similarity queries over them.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{CachedEntry, IndexCache, source_fingerprint};
use crate::chunking::{Chunker, chunker_for};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, RetrievedChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::inmemory::InMemoryVectorStore;
use crate::vectorstore::VectorStore;

/// Summary statistics of a built index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of chunks in the index.
    pub chunk_count: usize,
    /// Total bytes of chunk text.
    pub total_chars: usize,
    /// Average chunk length in bytes.
    pub avg_chunk_chars: usize,
    /// Chunk size the index was built with.
    pub chunk_size: usize,
    /// Chunk overlap the index was built with.
    pub chunk_overlap: usize,
}

/// An immutable index over one document.
///
/// Built once by [`IndexBuilder`]; re-indexing replaces the whole value.
/// Retrieval is read-only and safe to call concurrently from any number of
/// tasks holding an `Arc<DocumentIndex>`.
pub struct DocumentIndex {
    identity: String,
    chunks: Vec<Chunk>,
    store: Arc<dyn VectorStore>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("identity", &self.identity)
            .field("chunks", &self.chunks)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .finish_non_exhaustive()
    }
}

impl DocumentIndex {
    /// Embed `chunks` and store them for similarity search.
    ///
    /// Atomic per document: if any chunk fails to embed (or the store
    /// rejects the batch), the whole build fails with
    /// [`RagError::Indexing`] and no partial index is exposed.
    pub async fn build(
        identity: &str,
        mut chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
        store: Arc<dyn VectorStore>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self> {
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = embedder.embed_batch(&texts).await.map_err(|e| RagError::Indexing {
            document_id: identity.to_string(),
            message: format!("embedding failed: {e}"),
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::Indexing {
                document_id: identity.to_string(),
                message: format!(
                    "embedder returned {} vectors for {} chunks",
                    embeddings.len(),
                    chunks.len()
                ),
            });
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        Self::restore(identity, chunks, store, chunk_size, chunk_overlap).await
    }

    /// Assemble an index from chunks that already carry embeddings.
    ///
    /// Used by the cache to rebuild the vector store without re-embedding.
    pub async fn restore(
        identity: &str,
        chunks: Vec<Chunk>,
        store: Arc<dyn VectorStore>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self> {
        let dimensions = chunks.first().map(|c| c.embedding.len()).unwrap_or(0);
        store.create_collection(identity, dimensions).await?;
        store.upsert(identity, &chunks).await.map_err(|e| RagError::Indexing {
            document_id: identity.to_string(),
            message: format!("vector store rejected chunks: {e}"),
        })?;

        info!(identity, chunk_count = chunks.len(), "document index ready");

        Ok(Self { identity: identity.to_string(), chunks, store, chunk_size, chunk_overlap })
    }

    /// Retrieve the `top_k` chunks most relevant to `query`.
    ///
    /// `top_k` is clamped to the number of indexed chunks. Results are
    /// ordered by descending cosine similarity, ties broken by original
    /// chunk position.
    ///
    /// # Errors
    ///
    /// [`RagError::EmptyIndex`] when the index has no chunks,
    /// [`RagError::Config`] when `top_k` is zero.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<RetrievedChunk>> {
        if self.chunks.is_empty() {
            return Err(RagError::EmptyIndex(self.identity.clone()));
        }
        if top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        let k = top_k.min(self.chunks.len());

        let query_embedding = embedder.embed(query).await?;
        let results = self.store.search(&self.identity, &query_embedding, k).await?;

        debug!(identity = %self.identity, requested = top_k, returned = results.len(), "retrieval completed");
        Ok(results)
    }

    /// The document identity this index was built for.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The indexed chunks, in document order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Number of indexed chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Chunk size the index was built with.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Chunk overlap the index was built with.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Summary statistics over the indexed chunks.
    pub fn stats(&self) -> IndexStats {
        let total_chars: usize = self.chunks.iter().map(|c| c.text.len()).sum();
        let avg_chunk_chars =
            if self.chunks.is_empty() { 0 } else { total_chars / self.chunks.len() };
        IndexStats {
            chunk_count: self.chunks.len(),
            total_chars,
            avg_chunk_chars,
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        }
    }
}

/// Builds [`DocumentIndex`]es from raw text: chunk, embed, store.
///
/// Caching is composed in, not inherited: [`load_or_build`](IndexBuilder::load_or_build)
/// takes an optional [`IndexCache`], and `None` simply builds every time.
pub struct IndexBuilder {
    config: RagConfig,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl IndexBuilder {
    /// Create a builder using the chunking strategy selected by `config`.
    pub fn new(config: RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let chunker = chunker_for(&config);
        Self { config, chunker, embedder }
    }

    /// The embedding provider used for indexing and queries.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// The retrieval configuration this builder was created with.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Chunk `text` and build a fresh index for it.
    pub async fn build(
        &self,
        identity: &str,
        text: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<DocumentIndex> {
        let document = Document {
            id: identity.to_string(),
            text: text.to_string(),
            metadata: metadata.clone(),
        };
        let chunks = self.chunker.chunk(&document);
        info!(identity, chunk_count = chunks.len(), text_bytes = text.len(), "chunked document");

        DocumentIndex::build(
            identity,
            chunks,
            self.embedder.as_ref(),
            Arc::new(InMemoryVectorStore::new()),
            self.config.chunk_size,
            self.config.chunk_overlap,
        )
        .await
    }

    /// Return a cached index for `identity` if one exists, otherwise build
    /// and (when a cache is supplied) persist one.
    ///
    /// The returned flag is `true` when the index was freshly built. With
    /// `force_reindex` the cache entry is ignored and overwritten. A corrupt
    /// cache entry surfaces as [`RagError::CacheRead`] rather than being
    /// silently rebuilt.
    pub async fn load_or_build(
        &self,
        cache: Option<&IndexCache>,
        identity: &str,
        text: &str,
        metadata: &HashMap<String, String>,
        force_reindex: bool,
    ) -> Result<(DocumentIndex, bool)> {
        let Some(cache) = cache else {
            return Ok((self.build(identity, text, metadata).await?, true));
        };

        if !force_reindex {
            if let Some(entry) = cache.load(identity).await? {
                self.warn_on_divergence(identity, text, &entry);
                let index = DocumentIndex::restore(
                    identity,
                    entry.chunks,
                    Arc::new(InMemoryVectorStore::new()),
                    entry.manifest.chunk_size,
                    entry.manifest.chunk_overlap,
                )
                .await?;
                info!(identity, chunk_count = index.chunk_count(), "loaded index from cache");
                return Ok((index, false));
            }
        }

        let index = self.build(identity, text, metadata).await?;
        cache.store(&index, source_fingerprint(text), metadata).await?;
        Ok((index, true))
    }

    /// Cached entries are served even when stale; make staleness visible.
    fn warn_on_divergence(&self, identity: &str, text: &str, entry: &CachedEntry) {
        if entry.manifest.source_fingerprint != source_fingerprint(text) {
            warn!(
                identity,
                "cached index was built from different source text; \
                 pass force_reindex to rebuild"
            );
        }
        if entry.manifest.chunk_size != self.config.chunk_size
            || entry.manifest.chunk_overlap != self.config.chunk_overlap
        {
            warn!(
                identity,
                cached_chunk_size = entry.manifest.chunk_size,
                cached_chunk_overlap = entry.manifest.chunk_overlap,
                "cached index was built with different chunking parameters"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Deterministic letter-frequency embedder.
    struct CountingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0f32; 26];
            for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
                v[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
            }
            Ok(v)
        }

        fn dimensions(&self) -> usize {
            26
        }
    }

    /// Embedder that fails on a marker substring.
    struct FlakyEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FlakyEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("poison") {
                return Err(RagError::Embedding {
                    provider: "flaky".to_string(),
                    message: "refused to embed".to_string(),
                });
            }
            Ok(vec![1.0])
        }

        fn dimensions(&self) -> usize {
            1
        }
    }

    fn builder(embedder: Arc<dyn EmbeddingProvider>) -> IndexBuilder {
        let config = RagConfig::builder().chunk_size(32).chunk_overlap(4).build().unwrap();
        IndexBuilder::new(config, embedder)
    }

    #[tokio::test]
    async fn retrieve_on_empty_index_fails() {
        let builder = builder(Arc::new(CountingEmbedder));
        let index = builder.build("empty", "", &HashMap::new()).await.unwrap();
        let err = index.retrieve("anything", 3, &CountingEmbedder).await.unwrap_err();
        assert!(matches!(err, RagError::EmptyIndex(_)));
    }

    #[tokio::test]
    async fn top_k_is_clamped_to_chunk_count() {
        let builder = builder(Arc::new(CountingEmbedder));
        let index = builder
            .build("doc", "alpha section. beta section. gamma section.", &HashMap::new())
            .await
            .unwrap();
        let results = index.retrieve("beta", 50, &CountingEmbedder).await.unwrap();
        assert_eq!(results.len(), index.chunk_count());
    }

    #[tokio::test]
    async fn zero_top_k_is_rejected() {
        let builder = builder(Arc::new(CountingEmbedder));
        let index = builder.build("doc", "some text", &HashMap::new()).await.unwrap();
        let err = index.retrieve("query", 0, &CountingEmbedder).await.unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[tokio::test]
    async fn embedding_failure_fails_the_whole_build() {
        let builder = builder(Arc::new(FlakyEmbedder));
        let text = "fine text here. poison in the middle. fine again at the end.";
        let err = builder.build("doc", text, &HashMap::new()).await.unwrap_err();
        assert!(matches!(err, RagError::Indexing { .. }));
    }

    #[tokio::test]
    async fn retrieval_is_deterministic_across_calls() {
        let builder = builder(Arc::new(CountingEmbedder));
        let index = builder
            .build("doc", "aaaa bbbb. cccc dddd. eeee ffff. gggg hhhh.", &HashMap::new())
            .await
            .unwrap();
        let first = index.retrieve("cccc", 3, &CountingEmbedder).await.unwrap();
        let second = index.retrieve("cccc", 3, &CountingEmbedder).await.unwrap();
        let ids = |rs: &[RetrievedChunk]| rs.iter().map(|r| r.chunk.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }
}
