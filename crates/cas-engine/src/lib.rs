//! The CAS engine: chunking/encryption/compression pipeline orchestration,
//! invariants, eventing and the error surface, built on top of the codec,
//! crypto and persistence ports.
//!
//! `Engine` holds no mutable state between calls — every operation is a
//! `&self` method — and is `Send + Sync` as long as the injected ports are,
//! so concurrent calls on the same instance require no locking here.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod compress;
mod config;
mod key_resolution;
mod maintenance;
mod restore;
mod store;
pub mod telemetry;
mod tree;

pub use cas_core::event::{
    has_observer, observer, set_observer, ChunkRestoredEvent, ChunkStoredEvent, EngineObserver,
    FileRestoredEvent, FileStoredEvent, IntegrityFailEvent,
};
pub use cas_core::{CasError, Manifest};
pub use config::{EngineConfig, EngineConfigBuilder, DEFAULT_CHUNK_SIZE, DEFAULT_MERKLE_THRESHOLD, MIN_CHUNK_SIZE};
pub use key_resolution::{KeyMaterial, DEFAULT_PBKDF2_ITERATIONS};
pub use maintenance::{DeleteAssetResult, FindOrphanedChunksResult};
pub use restore::{RestoreInput, RestoreOutput};
pub use store::StoreInput;

use std::sync::Arc;

use cas_codec::Codec;
use cas_crypto::CryptoPort;
use cas_persistence::PersistencePort;

/// Orchestrates the store/restore/tree/maintenance pipeline over a
/// persistence, crypto and codec port. Cheap to clone (every field is an
/// `Arc` or a small `Copy` config struct) so embedders can share one engine
/// across tasks.
#[derive(Clone)]
pub struct Engine {
    persistence: Arc<dyn PersistencePort>,
    crypto: Arc<dyn CryptoPort>,
    codec: Arc<dyn Codec>,
    config: EngineConfig,
}

impl Engine {
    /// Construct an engine over the given ports and configuration.
    #[must_use]
    pub fn new(
        persistence: Arc<dyn PersistencePort>,
        crypto: Arc<dyn CryptoPort>,
        codec: Arc<dyn Codec>,
        config: EngineConfig,
    ) -> Self {
        Self { persistence, crypto, codec, config }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
