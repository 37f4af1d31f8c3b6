//! The engine facade consumed by transports.

use std::collections::HashMap;
use std::sync::Arc;

use docq_rag::{
    DocumentIndex, EmbeddingProvider, IndexBuilder, IndexCache, IndexStats, InMemoryVectorStore,
};
use docq_model::CompletionModel;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::batch::{BatchOutcome, answer_batch, answer_single};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::orchestrator::{AnswerOrchestrator, AnswerRecord};

/// Result of indexing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSummary {
    /// The document identity that was indexed.
    pub identity: String,
    /// `false` when the index was served from the cache.
    pub freshly_built: bool,
    /// Statistics of the built index.
    pub stats: IndexStats,
}

/// The document question answering engine.
///
/// One explicit object with an injected embedder, completion model, and
/// optional cache; no ambient global state, so independent engines can run
/// side by side (tests rely on this). Built indexes are held in an
/// instance-local map keyed by identity and shared as `Arc`s, which keeps
/// retrieval concurrent and lock-free once an index is loaded.
pub struct QaEngine {
    config: EngineConfig,
    builder: IndexBuilder,
    cache: Option<IndexCache>,
    orchestrator: AnswerOrchestrator,
    indexes: RwLock<HashMap<String, Arc<DocumentIndex>>>,
}

impl QaEngine {
    /// Create an engine from configuration and its two external capabilities.
    pub fn new(
        config: EngineConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn CompletionModel>,
    ) -> Self {
        let builder = IndexBuilder::new(config.rag.clone(), embedder);
        let cache = config.cache_dir.as_ref().map(|dir| IndexCache::new(dir.clone()));
        let orchestrator = AnswerOrchestrator::new(model, config.stage_timeout);
        Self { config, builder, cache, orchestrator, indexes: RwLock::new(HashMap::new()) }
    }

    /// Index a document under `identity`, reusing a cached index when one
    /// exists and `force_reindex` is false.
    pub async fn index(
        &self,
        identity: &str,
        text: &str,
        metadata: &HashMap<String, String>,
        force_reindex: bool,
    ) -> Result<IndexSummary> {
        let (index, freshly_built) = self
            .builder
            .load_or_build(self.cache.as_ref(), identity, text, metadata, force_reindex)
            .await?;
        let stats = index.stats();

        self.indexes.write().await.insert(identity.to_string(), Arc::new(index));
        info!(identity, freshly_built, chunk_count = stats.chunk_count, "document indexed");

        Ok(IndexSummary { identity: identity.to_string(), freshly_built, stats })
    }

    /// Answer one question about an indexed document.
    ///
    /// `top_k` falls back to the configured default. Errors propagate:
    /// an unknown identity, an empty index, or an extraction failure all
    /// fail the call.
    pub async fn answer_one(
        &self,
        identity: &str,
        question: &str,
        top_k: Option<usize>,
    ) -> Result<AnswerRecord> {
        let index = self.loaded(identity).await?;
        let top_k = top_k.unwrap_or(self.config.rag.top_k);
        let (record, _) = answer_single(
            &index,
            self.builder.embedder().as_ref(),
            &self.orchestrator,
            question,
            top_k,
        )
        .await?;
        Ok(record)
    }

    /// Answer a list of questions about an indexed document.
    ///
    /// Always returns one record per question, in input order; individual
    /// failures are captured as flagged records and never abort the batch.
    pub async fn answer_many(
        &self,
        identity: &str,
        questions: &[String],
        top_k: Option<usize>,
    ) -> Result<BatchOutcome> {
        let index = self.loaded(identity).await?;
        let top_k = top_k.unwrap_or(self.config.rag.top_k);
        Ok(answer_batch(
            &index,
            self.builder.embedder().as_ref(),
            &self.orchestrator,
            questions,
            top_k,
        )
        .await)
    }

    /// Statistics of the index for `identity`, if one is loaded.
    pub async fn stats(&self, identity: &str) -> Option<IndexStats> {
        self.indexes.read().await.get(identity).map(|index| index.stats())
    }

    /// Fetch a loaded index, restoring it from the cache when this engine
    /// has not indexed `identity` in-process but a persisted entry exists.
    async fn loaded(&self, identity: &str) -> Result<Arc<DocumentIndex>> {
        if let Some(index) = self.indexes.read().await.get(identity) {
            return Ok(index.clone());
        }

        if let Some(cache) = &self.cache {
            if let Some(entry) = cache.load(identity).await? {
                let index = DocumentIndex::restore(
                    identity,
                    entry.chunks,
                    Arc::new(InMemoryVectorStore::new()),
                    entry.manifest.chunk_size,
                    entry.manifest.chunk_overlap,
                )
                .await?;
                let index = Arc::new(index);
                self.indexes.write().await.insert(identity.to_string(), index.clone());
                info!(identity, "restored index from cache");
                return Ok(index);
            }
        }

        Err(EngineError::NotIndexed(identity.to_string()))
    }
}
