//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`] — splits at the most natural boundary available
//!   (paragraph, line, sentence, word), falling back to a hard character
//!   split only when nothing else fits
//! - [`SlidingChunker`] — fixed stride window with an exact overlap guarantee
//!
//! All sizes are byte lengths; splits never land inside a UTF-8 character.

use std::sync::Arc;

use crate::config::{ChunkStrategy, RagConfig};
use crate::document::{Chunk, Document};

/// Separator ladder tried by [`RecursiveChunker`], most natural first.
/// The hard character split acts as the implicit last resort.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no
/// embeddings; embeddings are attached later by the index builder.
///
/// Contract for every implementation: no chunk exceeds the configured
/// chunk size, chunk order equals document order, an empty document yields
/// zero chunks, and a document no longer than the chunk size yields exactly
/// one chunk.
pub trait Chunker: Send + Sync {
    /// Split a document into ordered chunks.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Build the chunker selected by a [`RagConfig`].
pub fn chunker_for(config: &RagConfig) -> Arc<dyn Chunker> {
    match config.strategy {
        ChunkStrategy::Recursive => {
            Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap))
        }
        ChunkStrategy::Sliding => {
            Arc::new(SlidingChunker::new(config.chunk_size, config.chunk_overlap))
        }
    }
}

/// Splits text at natural boundaries, trying paragraph breaks first, then
/// line breaks, sentence ends, and spaces; segments that fit nowhere are
/// hard-split by size, which guarantees termination.
///
/// Overlap is attempted: the tail of the previous chunk is prepended to the
/// next one whenever the combined text still respects the size limit.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum chunk length in bytes
    /// * `chunk_overlap` — overlap carried between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let pieces = split_recursive(&document.text, self.chunk_size, self.chunk_overlap, &SEPARATORS);
        let pieces = apply_overlap(pieces, self.chunk_size, self.chunk_overlap);

        pieces
            .into_iter()
            .enumerate()
            .map(|(position, text)| make_chunk(document, position, text))
            .collect()
    }
}

/// Splits text with a fixed stride of `chunk_size - chunk_overlap`, so every
/// pair of consecutive chunks shares exactly `chunk_overlap` bytes (modulo
/// character-boundary adjustment near multi-byte characters).
#[derive(Debug, Clone)]
pub struct SlidingChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SlidingChunker {
    /// Create a new `SlidingChunker`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for SlidingChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        split_by_size(&document.text, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(position, text)| make_chunk(document, position, text))
            .collect()
    }
}

fn make_chunk(document: &Document, position: usize, text: String) -> Chunk {
    let mut metadata = document.metadata.clone();
    metadata.insert("chunk_index".to_string(), position.to_string());
    Chunk {
        id: format!("{}_{position}", document.id),
        text,
        embedding: Vec::new(),
        position,
        metadata,
        document_id: document.id.clone(),
    }
}

/// Largest index `<= at` that lies on a character boundary.
fn floor_char_boundary(text: &str, at: usize) -> usize {
    if at >= text.len() {
        return text.len();
    }
    let mut index = at;
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Split at the first separator in `separators` that applies, merging the
/// resulting segments back together up to `chunk_size`. Segments that still
/// exceed the limit recurse into the next separator level; the final level
/// hard-splits by size.
fn split_recursive(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }
    let Some((separator, rest)) = separators.split_first() else {
        return split_by_size(text, chunk_size, chunk_overlap);
    };

    let segments = split_keeping_separator(text, separator);
    let mut pieces = Vec::new();
    let mut current = String::new();

    for segment in segments {
        if current.is_empty() {
            current = segment.to_string();
        } else if current.len() + segment.len() <= chunk_size {
            current.push_str(segment);
        } else {
            flush_piece(&mut pieces, current, chunk_size, chunk_overlap, rest);
            current = segment.to_string();
        }
    }
    if !current.is_empty() {
        flush_piece(&mut pieces, current, chunk_size, chunk_overlap, rest);
    }

    pieces
}

fn flush_piece(
    pieces: &mut Vec<String>,
    piece: String,
    chunk_size: usize,
    chunk_overlap: usize,
    rest: &[&str],
) {
    if piece.len() > chunk_size {
        pieces.extend(split_recursive(&piece, chunk_size, chunk_overlap, rest));
    } else {
        pieces.push(piece);
    }
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment, so rejoining the segments reproduces the input.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut segments = Vec::new();
    let mut start = 0;

    while let Some(found) = text[start..].find(separator) {
        let end = start + found + separator.len();
        segments.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        segments.push(&text[start..]);
    }

    segments
}

/// Prepend the tail of each piece to its successor when the result still
/// fits in `chunk_size`. Best effort: oversized combinations keep the
/// successor untouched rather than violate the size bound.
fn apply_overlap(pieces: Vec<String>, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if chunk_overlap == 0 || pieces.len() < 2 {
        return pieces;
    }

    let mut out = Vec::with_capacity(pieces.len());
    out.push(pieces[0].clone());
    for window in pieces.windows(2) {
        let (prev, piece) = (&window[0], &window[1]);
        let tail_start = floor_char_boundary(prev, prev.len().saturating_sub(chunk_overlap));
        let tail = &prev[tail_start..];
        if !tail.is_empty() && tail.len() + piece.len() <= chunk_size {
            out.push(format!("{tail}{piece}"));
        } else {
            out.push(piece.clone());
        }
    }
    out
}

/// Fixed-stride character splitting with overlap.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = floor_char_boundary(text, (start + chunk_size).min(text.len()));
        if end <= start {
            // chunk_size smaller than the next character; take it whole
            end = next_char_boundary(text, start);
        }
        chunks.push(text[start..end].to_string());
        if end == text.len() {
            break;
        }

        let step = chunk_size.saturating_sub(chunk_overlap);
        if step == 0 {
            break;
        }
        let mut next = floor_char_boundary(text, start + step);
        if next <= start {
            next = next_char_boundary(text, start);
        }
        start = next;
    }

    chunks
}

/// Smallest index `> at` that lies on a character boundary.
fn next_char_boundary(text: &str, at: usize) -> usize {
    let mut index = at + 1;
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index.min(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new("doc", text)
    }

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        assert!(RecursiveChunker::new(100, 20).chunk(&doc("")).is_empty());
        assert!(SlidingChunker::new(100, 20).chunk(&doc("")).is_empty());
    }

    #[test]
    fn short_document_yields_single_chunk() {
        let chunks = RecursiveChunker::new(100, 20).chunk(&doc("just one short line"));
        assert_eq!(texts(&chunks), vec!["just one short line"]);
        assert_eq!(chunks[0].position, 0);
        assert_eq!(chunks[0].id, "doc_0");
    }

    #[test]
    fn recursive_respects_size_bound() {
        let text = "Lorem ipsum dolor sit amet. Consectetur adipiscing elit. \
                    Sed do eiusmod tempor incididunt.\n\nUt labore et dolore magna aliqua. \
                    Ut enim ad minim veniam, quis nostrud exercitation.";
        for chunk_size in [12, 25, 40, 80] {
            let chunks = RecursiveChunker::new(chunk_size, 4).chunk(&doc(text));
            assert!(!chunks.is_empty());
            for chunk in &chunks {
                assert!(
                    chunk.text.len() <= chunk_size,
                    "chunk of {} bytes exceeds limit {chunk_size}",
                    chunk.text.len()
                );
            }
        }
    }

    #[test]
    fn recursive_prefers_sentence_boundaries() {
        let chunks = RecursiveChunker::new(20, 0).chunk(&doc("First one. Second one. Third one."));
        assert!(chunks.iter().all(|c| c.text.len() <= 20));
        // Sentences survive intact rather than being split mid-word.
        assert!(chunks[0].text.starts_with("First one."));
    }

    #[test]
    fn recursive_overlap_is_attempted_when_it_fits() {
        let chunks = RecursiveChunker::new(30, 8).chunk(&doc(
            "alpha beta gamma delta. epsilon zeta eta theta. iota kappa lambda mu.",
        ));
        assert!(chunks.len() >= 2);
        let mut carried = 0;
        for window in chunks.windows(2) {
            // Either the successor carries the predecessor's tail, or the
            // combination would have exceeded the size bound.
            let prev = &window[0].text;
            let succ = &window[1].text;
            let tail = &prev[prev.len().saturating_sub(8)..];
            if succ.starts_with(tail) {
                carried += 1;
            } else {
                assert!(tail.len() + succ.len() > 30);
            }
            assert!(succ.len() <= 30);
        }
        assert!(carried >= 1, "no chunk pair carried overlap");
    }

    #[test]
    fn sliding_overlap_is_exact() {
        let chunks = SlidingChunker::new(4, 2).chunk(&doc("abcdefghij"));
        assert_eq!(texts(&chunks), vec!["abcd", "cdef", "efgh", "ghij"]);
        for window in chunks.windows(2) {
            let prev = &window[0].text;
            assert_eq!(prev[prev.len() - 2..], window[1].text[..2]);
        }
    }

    #[test]
    fn sliding_positions_follow_document_order() {
        let chunks = SlidingChunker::new(5, 1).chunk(&doc("abcdefghijklmno"));
        for (expected, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.position, expected);
            assert_eq!(chunk.metadata.get("chunk_index").unwrap(), &expected.to_string());
        }
    }

    #[test]
    fn multibyte_text_never_panics_and_respects_bound() {
        let text = "héllo wörld, ünïcode ëverywhere. Ça marche très bien, non ?";
        for (size, overlap) in [(7, 3), (10, 4), (25, 8)] {
            for chunks in [
                RecursiveChunker::new(size, overlap).chunk(&doc(text)),
                SlidingChunker::new(size, overlap).chunk(&doc(text)),
            ] {
                assert!(!chunks.is_empty());
                for chunk in &chunks {
                    assert!(chunk.text.len() <= size);
                    assert!(std::str::from_utf8(chunk.text.as_bytes()).is_ok());
                }
            }
        }
    }

    #[test]
    fn hard_split_terminates_on_unbroken_text() {
        let text = "x".repeat(1000);
        let chunks = RecursiveChunker::new(64, 16).chunk(&doc(&text));
        assert!(chunks.iter().all(|c| c.text.len() <= 64));
        assert!(chunks.len() > 10);
    }
}
