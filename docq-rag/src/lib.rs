//! # docq-rag
//!
//! Retrieval core for document question answering: chunk a document, embed
//! the chunks, index them for similarity search, and persist the result so
//! an unchanged document is never embedded twice.
//!
//! ## Overview
//!
//! - [`Chunker`] — splitting strategies ([`RecursiveChunker`], [`SlidingChunker`])
//! - [`EmbeddingProvider`] — pluggable text-to-vector backend
//! - [`VectorStore`] / [`InMemoryVectorStore`] — nearest-neighbor lookup
//! - [`DocumentIndex`] — one document's chunks plus its vector store
//! - [`IndexBuilder`] — chunk → embed → index, with optional caching
//! - [`IndexCache`] — on-disk persistence keyed by document identity
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docq_rag::{IndexBuilder, IndexCache, RagConfig};
//!
//! let config = RagConfig::builder().chunk_size(1200).chunk_overlap(200).build()?;
//! let builder = IndexBuilder::new(config, Arc::new(my_embedder));
//! let cache = IndexCache::new("cache");
//!
//! let (index, fresh) = builder
//!     .load_or_build(Some(&cache), "report-2026", &text, &metadata, false)
//!     .await?;
//! let hits = index.retrieve("What changed in Q2?", 5, builder.embedder().as_ref()).await?;
//! ```

pub mod cache;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod inmemory;
pub mod vectorstore;

pub use cache::{CachedEntry, IndexCache, Manifest, source_fingerprint};
pub use chunking::{Chunker, RecursiveChunker, SlidingChunker, chunker_for};
pub use config::{ChunkStrategy, RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, RetrievedChunk};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use index::{DocumentIndex, IndexBuilder, IndexStats};
pub use inmemory::InMemoryVectorStore;
pub use vectorstore::VectorStore;
