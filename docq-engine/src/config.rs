//! Engine configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use docq_rag::RagConfig;

use crate::error::{EngineError, Result};

const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 60;

/// Configuration for a [`QaEngine`](crate::QaEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Chunking and retrieval parameters.
    pub rag: RagConfig,
    /// Directory for persisted indexes; `None` disables caching.
    pub cache_dir: Option<PathBuf>,
    /// Hard timeout applied around each completion stage.
    pub stage_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rag: RagConfig::default(),
            cache_dir: Some(PathBuf::from("output/cache")),
            stage_timeout: Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECS),
        }
    }
}

impl EngineConfig {
    /// Disable index caching; every `index` call rebuilds from scratch.
    pub fn without_cache(mut self) -> Self {
        self.cache_dir = None;
        self
    }

    /// Set the cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Set the per-stage completion timeout.
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Read configuration from the environment, falling back to defaults.
    ///
    /// Recognized variables: `DOCQ_CACHE_DIR`, `DOCQ_CHUNK_SIZE`,
    /// `DOCQ_CHUNK_OVERLAP`, `DOCQ_TOP_K`, `DOCQ_STAGE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = env::var("DOCQ_CACHE_DIR") {
            config.cache_dir = Some(PathBuf::from(dir));
        }

        let mut rag = RagConfig::builder();
        let defaults = RagConfig::default();
        rag = rag
            .chunk_size(env_usize("DOCQ_CHUNK_SIZE", defaults.chunk_size)?)
            .chunk_overlap(env_usize("DOCQ_CHUNK_OVERLAP", defaults.chunk_overlap)?)
            .top_k(env_usize("DOCQ_TOP_K", defaults.top_k)?);
        config.rag = rag.build()?;

        let timeout = env_usize("DOCQ_STAGE_TIMEOUT_SECS", DEFAULT_STAGE_TIMEOUT_SECS as usize)?;
        config.stage_timeout = Duration::from_secs(timeout as u64);

        Ok(config)
    }
}

fn env_usize(name: &str, default: usize) -> Result<usize> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| EngineError::Config(format!("{name} must be an integer, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}
