//! Two-stage answer orchestration: extract strictly from context, then
//! reformat the raw answer for readability.

use std::sync::Arc;
use std::time::Duration;

use docq_model::{CompletionModel, CompletionRequest, Usage};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::error::{EngineError, Result};

/// System instruction for the extraction stage. The model must answer from
/// the supplied sections only, flag missing answers explicitly, and quote
/// rather than infer.
const EXTRACTION_SYSTEM: &str = "\
You are a document analysis assistant. Your only job is to extract \
information from the provided document sections.
Rules:
1. Answer using only information explicitly stated in the sections.
2. Do not use outside knowledge of any kind.
3. If the answer is not present, respond with 'This information is not \
found in the document'.
4. Quote the document directly whenever possible.
5. Do not make inferences beyond what is explicitly stated.";

/// System instruction for the summarization stage. Every factual detail and
/// any not-found statement must survive the rewrite.
const SUMMARIZATION_SYSTEM: &str = "\
You restructure answers so they are clear and easy to read.
Rules:
1. Keep every factual detail from the original answer.
2. If the answer states that information was not found, keep that statement.
3. Use bullet points, numbering, or short paragraphs as appropriate.
4. Remove redundancy only; never drop information.";

/// Per-stage token accounting for one answered question.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerUsage {
    /// Usage of the extraction call.
    pub extraction: Usage,
    /// Usage of the summarization call; `None` when that stage failed or
    /// never ran.
    pub summarization: Option<Usage>,
}

/// The outcome of answering one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// The question that was asked.
    pub question: String,
    /// The extraction stage's answer, constrained to the retrieved context.
    pub raw_answer: String,
    /// The reformatted answer; equals `raw_answer` when summarization
    /// degraded.
    pub summarized_answer: String,
    /// The completion model that produced the answers.
    pub model: String,
    /// Per-stage token accounting.
    pub usage: AnswerUsage,
    /// Set when the summarization stage failed and the raw answer was
    /// served instead. Not a record-level failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summarization_error: Option<String>,
    /// `true` when the question failed entirely; the answer fields then
    /// hold a descriptive error message.
    pub error: bool,
}

impl AnswerRecord {
    /// A fully failed record: the message stands in for both answers.
    pub fn failure(
        question: impl Into<String>,
        model: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self {
            question: question.into(),
            raw_answer: message.clone(),
            summarized_answer: message,
            model: model.into(),
            usage: AnswerUsage::default(),
            summarization_error: None,
            error: true,
        }
    }
}

/// Drives the two-stage generation for one question at a time.
pub struct AnswerOrchestrator {
    model: Arc<dyn CompletionModel>,
    stage_timeout: Duration,
}

impl AnswerOrchestrator {
    /// Create an orchestrator over the given completion model.
    pub fn new(model: Arc<dyn CompletionModel>, stage_timeout: Duration) -> Self {
        Self { model, stage_timeout }
    }

    /// Name of the underlying completion model.
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Answer `question` from `context`.
    ///
    /// Stage 1 (extraction) failure fails the whole call with
    /// [`EngineError::Generation`]. Stage 2 (summarization) failure degrades:
    /// the raw answer is served as the summarized answer and
    /// `summarization_error` is set, but the record is still a success.
    pub async fn answer(&self, context: &str, question: &str) -> Result<AnswerRecord> {
        let extraction_user = format!(
            "DOCUMENT CONTENT:\n---\n{context}\n---\n\nQUESTION: {question}\n\n\
             Extract the answer from the document content above. Use only \
             information from the document."
        );
        let extraction = self
            .call("extraction", CompletionRequest::new(EXTRACTION_SYSTEM, extraction_user))
            .await?;
        let raw_answer = extraction.text;

        let summarization_user = format!(
            "Original question: {question}\n\nRaw answer:\n---\n{raw_answer}\n---\n\n\
             Rewrite this answer so it is clear and well structured without \
             losing any information."
        );
        let summarization = self
            .call("summarization", CompletionRequest::new(SUMMARIZATION_SYSTEM, summarization_user))
            .await;

        let record = match summarization {
            Ok(summary) => AnswerRecord {
                question: question.to_string(),
                raw_answer,
                summarized_answer: summary.text,
                model: self.model.name().to_string(),
                usage: AnswerUsage {
                    extraction: extraction.usage,
                    summarization: Some(summary.usage),
                },
                summarization_error: None,
                error: false,
            },
            Err(err) => {
                warn!(error = %err, "summarization failed; serving raw answer");
                AnswerRecord {
                    question: question.to_string(),
                    summarized_answer: raw_answer.clone(),
                    raw_answer,
                    model: self.model.name().to_string(),
                    usage: AnswerUsage { extraction: extraction.usage, summarization: None },
                    summarization_error: Some(err.to_string()),
                    error: false,
                }
            }
        };

        info!(
            question_bytes = question.len(),
            degraded = record.summarization_error.is_some(),
            "answered question"
        );
        Ok(record)
    }

    /// Run one completion stage under the configured timeout.
    pub(crate) async fn call(
        &self,
        stage: &str,
        request: CompletionRequest,
    ) -> Result<docq_model::Completion> {
        match timeout(self.stage_timeout, self.model.complete(request)).await {
            Ok(Ok(completion)) => Ok(completion),
            Ok(Err(err)) => Err(EngineError::Generation(format!("{stage} call failed: {err}"))),
            Err(_) => Err(EngineError::Generation(format!(
                "{stage} call timed out after {}s",
                self.stage_timeout.as_secs()
            ))),
        }
    }
}
