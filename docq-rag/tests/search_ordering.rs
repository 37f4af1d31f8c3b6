//! Property tests for in-memory vector store search ordering.

use std::collections::HashMap;

use docq_rag::document::Chunk;
use docq_rag::inmemory::InMemoryVectorStore;
use docq_rag::vectorstore::VectorStore;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

fn chunk(position: usize, embedding: Vec<f32>) -> Chunk {
    Chunk {
        id: format!("doc_{position}"),
        text: format!("chunk number {position}"),
        embedding,
        position,
        metadata: HashMap::new(),
        document_id: "doc".to_string(),
    }
}

const DIM: usize = 16;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any set of embedded chunks, search returns at most `top_k`
    /// results ordered by descending cosine similarity, with equal scores
    /// ordered by original chunk position.
    #[test]
    fn results_ordered_descending_with_position_tie_break(
        embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
        query in arb_normalized_embedding(DIM),
        top_k in 1usize..25,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (results, stored) = rt.block_on(async {
            let store = InMemoryVectorStore::new();
            store.create_collection("doc", DIM).await.unwrap();
            let chunks: Vec<Chunk> = embeddings
                .into_iter()
                .enumerate()
                .map(|(position, embedding)| chunk(position, embedding))
                .collect();
            let stored = chunks.len();
            store.upsert("doc", &chunks).await.unwrap();
            (store.search("doc", &query, top_k).await.unwrap(), stored)
        });

        prop_assert!(results.len() <= top_k);
        prop_assert!(results.len() <= stored);

        for window in results.windows(2) {
            prop_assert!(
                window[0].score >= window[1].score,
                "results not in descending order: {} < {}",
                window[0].score,
                window[1].score,
            );
            if window[0].score == window[1].score {
                prop_assert!(
                    window[0].chunk.position < window[1].chunk.position,
                    "tie not broken by document position",
                );
            }
        }
    }

    /// Duplicated embeddings must come back in document order.
    #[test]
    fn identical_embeddings_preserve_document_order(
        embedding in arb_normalized_embedding(DIM),
        copies in 2usize..10,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let results = rt.block_on(async {
            let store = InMemoryVectorStore::new();
            store.create_collection("doc", DIM).await.unwrap();
            let chunks: Vec<Chunk> =
                (0..copies).map(|position| chunk(position, embedding.clone())).collect();
            store.upsert("doc", &chunks).await.unwrap();
            store.search("doc", &embedding, copies).await.unwrap()
        });

        let positions: Vec<usize> = results.iter().map(|r| r.chunk.position).collect();
        let expected: Vec<usize> = (0..copies).collect();
        prop_assert_eq!(positions, expected);
    }
}
