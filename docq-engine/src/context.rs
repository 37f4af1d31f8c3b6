//! Assembling retrieved chunks into a prompt-ready context string.

use docq_rag::RetrievedChunk;

/// Concatenate retrieved chunks, in their ranked order, into one context
/// string. Each chunk is prefixed with a stable section label so the result
/// is self-describing when embedded in a prompt; sections are separated by
/// a blank line. Empty input yields an empty string.
pub fn assemble_context(results: &[RetrievedChunk]) -> String {
    let sections: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, result)| format!("[Relevant Section {}]\n{}", i + 1, result.chunk.text))
        .collect();
    sections.join("\n\n")
}
