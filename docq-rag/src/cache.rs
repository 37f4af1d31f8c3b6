//! On-disk persistence for document indexes, keyed by document identity.
//!
//! One cache entry is a directory under the cache root, named by the
//! sanitized identity, holding two files: `chunks.json` (chunks with their
//! embeddings) and `manifest.json`. The manifest is written last and acts
//! as the publish step: an entry without a readable, consistent manifest is
//! treated as absent, so a crash mid-write can never produce an entry that
//! loads successfully but is internally inconsistent.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::document::Chunk;
use crate::error::{RagError, Result};
use crate::index::DocumentIndex;

const MANIFEST_FILE: &str = "manifest.json";
const CHUNKS_FILE: &str = "chunks.json";
const FORMAT_VERSION: u32 = 1;

/// Cache entry manifest, persisted alongside the chunk data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// On-disk format version; bumped on incompatible layout changes.
    pub format_version: u32,
    /// The (unsanitized) document identity.
    pub identity: String,
    /// Number of chunks recorded in the chunk file.
    pub chunk_count: usize,
    /// Chunk size the index was built with.
    pub chunk_size: usize,
    /// Chunk overlap the index was built with.
    pub chunk_overlap: usize,
    /// Embedding dimensionality.
    pub dimensions: usize,
    /// FNV-1a fingerprint of the source text the index was built from.
    pub source_fingerprint: u64,
    /// Document metadata captured at indexing time.
    pub metadata: HashMap<String, String>,
}

/// A deserialized cache entry: manifest plus embedded chunks.
#[derive(Debug, Clone)]
pub struct CachedEntry {
    /// The entry's manifest.
    pub manifest: Manifest,
    /// The persisted chunks, embeddings included.
    pub chunks: Vec<Chunk>,
}

/// Filesystem-backed cache for built document indexes.
///
/// Identities are sanitized into deterministic directory names so repeated
/// runs reuse previously built indexes instead of re-embedding. There is no
/// automatic invalidation: the same identity always resolves to the same
/// entry until a caller forces a rebuild (staleness is detected and logged,
/// not acted on). Concurrent builders targeting the same identity are
/// unsupported; last writer wins.
#[derive(Clone, Debug)]
pub struct IndexCache {
    root: PathBuf,
}

impl IndexCache {
    /// Creates a cache rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the entry for `identity`.
    pub fn entry_dir(&self, identity: &str) -> PathBuf {
        self.root.join(sanitize_identity(identity))
    }

    /// Whether a published entry exists for `identity`.
    pub fn contains(&self, identity: &str) -> bool {
        self.entry_dir(identity).join(MANIFEST_FILE).exists()
    }

    /// Load the entry for `identity`, or `None` when no entry is published.
    ///
    /// # Errors
    ///
    /// [`RagError::CacheRead`] when an entry exists but is corrupt or
    /// incompatible (unreadable files, undecodable JSON, wrong format
    /// version, or a chunk count that disagrees with the manifest).
    pub async fn load(&self, identity: &str) -> Result<Option<CachedEntry>> {
        let dir = self.entry_dir(identity);
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Ok(None);
        }

        let manifest: Manifest = read_json(&manifest_path, identity).await?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(cache_read(
                identity,
                format!(
                    "unsupported format version {} (expected {FORMAT_VERSION})",
                    manifest.format_version
                ),
            ));
        }

        let chunks: Vec<Chunk> = read_json(&dir.join(CHUNKS_FILE), identity).await?;
        if chunks.len() != manifest.chunk_count {
            return Err(cache_read(
                identity,
                format!(
                    "chunk file holds {} chunks but manifest records {}",
                    chunks.len(),
                    manifest.chunk_count
                ),
            ));
        }

        debug!(identity, chunk_count = chunks.len(), "cache hit");
        Ok(Some(CachedEntry { manifest, chunks }))
    }

    /// Persist `index` under its identity, replacing any existing entry.
    ///
    /// Write order is chunks first, manifest last; an existing manifest is
    /// removed up front so a crash mid-write leaves an unpublished entry,
    /// never a half-updated one.
    pub async fn store(
        &self,
        index: &DocumentIndex,
        source_fingerprint: u64,
        metadata: &HashMap<String, String>,
    ) -> Result<()> {
        let dir = self.entry_dir(index.identity());
        fs::create_dir_all(&dir).await?;

        let manifest_path = dir.join(MANIFEST_FILE);
        if manifest_path.exists() {
            fs::remove_file(&manifest_path).await?;
        }

        let chunks_json = serde_json::to_vec(index.chunks())
            .map_err(|e| cache_read(index.identity(), format!("failed to encode chunks: {e}")))?;
        fs::write(dir.join(CHUNKS_FILE), chunks_json).await?;

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            identity: index.identity().to_string(),
            chunk_count: index.chunk_count(),
            chunk_size: index.chunk_size(),
            chunk_overlap: index.chunk_overlap(),
            dimensions: index.chunks().first().map(|c| c.embedding.len()).unwrap_or(0),
            source_fingerprint,
            metadata: metadata.clone(),
        };
        let manifest_json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| cache_read(index.identity(), format!("failed to encode manifest: {e}")))?;
        fs::write(&manifest_path, manifest_json).await?;

        info!(identity = index.identity(), dir = %dir.display(), "persisted index");
        Ok(())
    }

    /// Remove the entry for `identity`, if any.
    pub async fn evict(&self, identity: &str) -> Result<()> {
        let dir = self.entry_dir(identity);
        if dir.exists() {
            fs::remove_dir_all(&dir).await?;
        }
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path, identity: &str) -> Result<T> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| cache_read(identity, format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| cache_read(identity, format!("cannot decode {}: {e}", path.display())))
}

fn cache_read(identity: &str, message: String) -> RagError {
    RagError::CacheRead { identity: identity.to_string(), message }
}

/// FNV-1a fingerprint of source text, recorded in the manifest so stale
/// entries can be detected. Pinned algorithm: fingerprints must stay
/// comparable across builds and library versions.
pub fn source_fingerprint(text: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET_BASIS;
    for byte in text.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Map an identity to a filesystem-safe directory name.
fn sanitize_identity(identity: &str) -> String {
    let sanitized: String = identity
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    if sanitized.is_empty() { "_".to_string() } else { sanitized }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_identity("report-2026_v1.2"), "report-2026_v1.2");
        assert_eq!(sanitize_identity("a/b\\c d"), "a_b_c_d");
        assert_eq!(sanitize_identity(""), "_");
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        assert_eq!(source_fingerprint("hello"), source_fingerprint("hello"));
        assert_ne!(source_fingerprint("hello"), source_fingerprint("hello "));
        // Pinned value: changing the algorithm breaks existing manifests.
        assert_eq!(source_fingerprint(""), 0xcbf2_9ce4_8422_2325);
    }
}
