//! Batch question answering: one record per question, no early abort.

use docq_rag::{DocumentIndex, EmbeddingProvider, IndexStats};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::context::assemble_context;
use crate::error::Result;
use crate::orchestrator::{AnswerOrchestrator, AnswerRecord};

/// Aggregate statistics over one answered batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchStats {
    /// Number of questions in the batch.
    pub total_questions: usize,
    /// Combined length of all assembled contexts, in bytes.
    pub total_context_chars: usize,
    /// Average context length per question, in bytes.
    pub avg_context_chars: usize,
    /// Statistics of the underlying document index.
    pub index: IndexStats,
}

/// Records plus aggregate statistics for one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// One record per input question, in input order.
    pub records: Vec<AnswerRecord>,
    /// Aggregate statistics.
    pub stats: BatchStats,
}

/// Answer a single question against an index: retrieve, assemble, generate.
///
/// Returns the record plus the length of the assembled context (for batch
/// statistics).
pub(crate) async fn answer_single(
    index: &DocumentIndex,
    embedder: &dyn EmbeddingProvider,
    orchestrator: &AnswerOrchestrator,
    question: &str,
    top_k: usize,
) -> Result<(AnswerRecord, usize)> {
    let results = index.retrieve(question, top_k, embedder).await?;
    let context = assemble_context(&results);
    info!(
        retrieved = results.len(),
        context_bytes = context.len(),
        "assembled context for question"
    );
    let record = orchestrator.answer(&context, question).await?;
    Ok((record, context.len()))
}

/// Answer every question in `questions`, in order.
///
/// Per-question failures become flagged records (`error = true`, message in
/// place of the answers); the batch itself never fails and always returns
/// exactly one record per question. Questions run sequentially: the
/// downstream generation calls are rate- and cost-sensitive.
pub(crate) async fn answer_batch(
    index: &DocumentIndex,
    embedder: &dyn EmbeddingProvider,
    orchestrator: &AnswerOrchestrator,
    questions: &[String],
    top_k: usize,
) -> BatchOutcome {
    let mut records = Vec::with_capacity(questions.len());
    let mut total_context_chars = 0usize;

    for (number, question) in questions.iter().enumerate() {
        info!(question_number = number + 1, total = questions.len(), "answering batch question");
        match answer_single(index, embedder, orchestrator, question, top_k).await {
            Ok((record, context_chars)) => {
                total_context_chars += context_chars;
                records.push(record);
            }
            Err(err) => {
                error!(question_number = number + 1, error = %err, "batch question failed");
                records.push(AnswerRecord::failure(
                    question,
                    orchestrator.model_name(),
                    format!("Error: {err}"),
                ));
            }
        }
    }

    let avg_context_chars =
        if questions.is_empty() { 0 } else { total_context_chars / questions.len() };
    BatchOutcome {
        records,
        stats: BatchStats {
            total_questions: questions.len(),
            total_context_chars,
            avg_context_chars,
            index: index.stats(),
        },
    }
}
