//! Validated, builder-constructed engine configuration.

use cas_core::CasError;

/// Minimum allowed `chunk_size`, enforced at construction.
pub const MIN_CHUNK_SIZE: usize = 1024;
/// Default `chunk_size`: 256 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 262_144;
/// Default `merkle_threshold`, sized for production scale. Tests override
/// this to a small value to exercise the Merkle-split code path.
pub const DEFAULT_MERKLE_THRESHOLD: usize = 4096;

/// Tunables for [`crate::Engine`]: the fixed chunk size used by the chunker
/// and the chunk-count threshold above which `create_tree` splits a
/// manifest into a Merkle (v2) root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    chunk_size: usize,
    merkle_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, merkle_threshold: DEFAULT_MERKLE_THRESHOLD }
    }
}

impl EngineConfig {
    /// Start a builder seeded with the defaults.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Fixed chunk size in bytes used by the chunker (final chunk may be
    /// shorter).
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Chunk count above which `create_tree` splits into a Merkle (v2)
    /// root. A chunk count *equal* to this value stays v1 — the split is
    /// strictly `>`.
    #[must_use]
    pub fn merkle_threshold(&self) -> usize {
        self.merkle_threshold
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfigBuilder {
    chunk_size: Option<usize>,
    merkle_threshold: Option<usize>,
}

impl EngineConfigBuilder {
    /// Override the chunk size. Rejected at `build()` time if below
    /// [`MIN_CHUNK_SIZE`].
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Override the Merkle split threshold.
    #[must_use]
    pub fn merkle_threshold(mut self, merkle_threshold: usize) -> Self {
        self.merkle_threshold = Some(merkle_threshold);
        self
    }

    /// Validate and build the config.
    pub fn build(self) -> Result<EngineConfig, CasError> {
        let chunk_size = self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        if chunk_size < MIN_CHUNK_SIZE {
            return Err(CasError::InvalidManifest(format!(
                "chunk_size must be >= {MIN_CHUNK_SIZE}, got {chunk_size}"
            )));
        }
        let merkle_threshold = self.merkle_threshold.unwrap_or(DEFAULT_MERKLE_THRESHOLD);
        if merkle_threshold == 0 {
            return Err(CasError::InvalidManifest("merkle_threshold must be positive".into()));
        }
        Ok(EngineConfig { chunk_size, merkle_threshold })
    }
}
