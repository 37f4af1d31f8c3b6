//! Whole-document analysis helpers: summaries and key-point extraction.
//!
//! These operate on caller-supplied text (typically the assembled context
//! or the full document) with a single completion call each.

use docq_model::CompletionRequest;

use crate::error::Result;
use crate::orchestrator::AnswerOrchestrator;

const ANALYSIS_SYSTEM: &str = "\
You are a document analysis assistant. Work only from the provided text; \
do not add outside information.";

impl AnswerOrchestrator {
    /// Produce a prose summary of `text`, optionally bounded to roughly
    /// `max_words` words.
    pub async fn summarize_document(&self, text: &str, max_words: Option<usize>) -> Result<String> {
        let length_instruction = match max_words {
            Some(words) => format!(" in approximately {words} words"),
            None => String::new(),
        };
        let user = format!(
            "TEXT:\n---\n{text}\n---\n\n\
             Provide a comprehensive summary of this text{length_instruction}."
        );
        let completion = self.call("summary", CompletionRequest::new(ANALYSIS_SYSTEM, user)).await?;
        Ok(completion.text)
    }

    /// Extract up to `num_points` key points from `text` as a list.
    ///
    /// The model is asked for bullet points; when the reply contains none,
    /// the whole answer is returned as a single entry rather than dropped.
    pub async fn extract_key_points(&self, text: &str, num_points: usize) -> Result<Vec<String>> {
        let user = format!(
            "TEXT:\n---\n{text}\n---\n\n\
             List the {num_points} most important key points of this text. \
             Format each point as a bullet point."
        );
        let completion =
            self.call("key points", CompletionRequest::new(ANALYSIS_SYSTEM, user)).await?;

        let mut points = parse_bullet_points(&completion.text);
        if points.is_empty() {
            points.push(completion.text);
        }
        points.truncate(num_points);
        Ok(points)
    }
}

/// Collect bullet- or number-prefixed lines from a model reply, with the
/// markers stripped.
pub fn parse_bullet_points(answer: &str) -> Vec<String> {
    answer
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.starts_with(['-', '*', '\u{2022}'])
                || line.chars().next().is_some_and(|c| c.is_ascii_digit())
        })
        .map(|line| {
            line.trim_start_matches(['-', '*', '\u{2022}'])
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .trim_start_matches(['.', ')'])
                .trim()
                .to_string()
        })
        .filter(|point| !point.is_empty())
        .collect()
}
