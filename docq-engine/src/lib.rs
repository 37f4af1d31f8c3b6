//! # docq-engine
//!
//! The document question answering engine. Ties the retrieval core
//! (`docq-rag`) to the completion boundary (`docq-model`) and exposes the
//! surface transports call:
//!
//! - [`QaEngine::index`] — chunk, embed, and cache a document
//! - [`QaEngine::answer_one`] — answer a single question from retrieved context
//! - [`QaEngine::answer_many`] — answer a batch, never aborting early
//!
//! Answering is two-stage: an extraction call constrained to the retrieved
//! context, then a summarization call that reformats the raw answer. A
//! failed summarization degrades gracefully to the raw answer; a failed
//! extraction fails that question.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docq_engine::{EngineConfig, QaEngine};
//!
//! let engine = QaEngine::new(EngineConfig::default(), embedder, model);
//! engine.index("report-2026", &text, &metadata, false).await?;
//! let record = engine.answer_one("report-2026", "What was Q2 revenue?", None).await?;
//! println!("{}", record.summarized_answer);
//! ```

pub mod analysis;
pub mod batch;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod orchestrator;

pub use analysis::parse_bullet_points;
pub use batch::{BatchOutcome, BatchStats};
pub use config::EngineConfig;
pub use context::assemble_context;
pub use engine::{IndexSummary, QaEngine};
pub use error::{EngineError, Result};
pub use orchestrator::{AnswerOrchestrator, AnswerRecord, AnswerUsage};
