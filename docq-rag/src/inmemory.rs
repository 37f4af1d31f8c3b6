//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] keeps collections in a `HashMap` behind a
//! `tokio::sync::RwLock`. One instance backs one or more document indexes;
//! a built index only ever reads, so concurrent retrieval is lock-cheap.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, RetrievedChunk};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "InMemory";

/// An in-memory vector store using cosine similarity for search.
///
/// Collections are nested maps: collection name → chunk ID → chunk.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, HashMap<String, Chunk>>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Cosine similarity of two vectors; 0.0 when either has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn missing_collection(collection: &str) -> RagError {
    RagError::VectorStore {
        backend: BACKEND.to_string(),
        message: format!("collection '{collection}' does not exist"),
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, _dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store =
            collections.get_mut(collection).ok_or_else(|| missing_collection(collection))?;
        for chunk in chunks {
            store.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing_collection(collection))?;

        let mut scored: Vec<RetrievedChunk> = store
            .values()
            .map(|chunk| {
                let score = cosine_similarity(&chunk.embedding, embedding);
                RetrievedChunk { chunk: chunk.clone(), score }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.position.cmp(&b.chunk.position))
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(position: usize, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: format!("doc_{position}"),
            text: format!("chunk {position}"),
            embedding,
            position,
            metadata: HashMap::new(),
            document_id: "doc".to_string(),
        }
    }

    #[tokio::test]
    async fn search_orders_by_score_then_position() {
        let store = InMemoryVectorStore::new();
        store.create_collection("doc", 2).await.unwrap();
        // Two chunks with identical embeddings, one clearly less similar.
        store
            .upsert(
                "doc",
                &[
                    chunk(2, vec![1.0, 0.0]),
                    chunk(0, vec![1.0, 0.0]),
                    chunk(1, vec![0.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        let results = store.search("doc", &[1.0, 0.0], 3).await.unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.chunk.position).collect();
        assert_eq!(order, vec![0, 2, 1]);
    }

    #[tokio::test]
    async fn search_truncates_to_top_k() {
        let store = InMemoryVectorStore::new();
        store.create_collection("doc", 2).await.unwrap();
        let chunks: Vec<Chunk> = (0..5).map(|i| chunk(i, vec![1.0, i as f32])).collect();
        store.upsert("doc", &chunks).await.unwrap();

        let results = store.search("doc", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn search_on_missing_collection_fails() {
        let store = InMemoryVectorStore::new();
        let err = store.search("nope", &[1.0], 1).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStore { .. }));
    }

    #[tokio::test]
    async fn zero_magnitude_embeddings_score_zero() {
        let store = InMemoryVectorStore::new();
        store.create_collection("doc", 2).await.unwrap();
        store.upsert("doc", &[chunk(0, vec![0.0, 0.0])]).await.unwrap();

        let results = store.search("doc", &[1.0, 0.0], 1).await.unwrap();
        assert_eq!(results[0].score, 0.0);
    }
}
