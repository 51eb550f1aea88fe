//! Value types, error taxonomy and event surface for the chunked
//! content-addressable asset store.
//!
//! This crate has no knowledge of how bytes are chunked, encrypted or
//! persisted — it only defines the validated records that flow between the
//! codec, crypto, persistence and engine layers, plus the error and event
//! types they all share.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod model;

pub use error::CasError;
pub use event::{
    ChunkRestoredEvent, ChunkStoredEvent, EngineObserver, FileRestoredEvent, FileStoredEvent,
    IntegrityFailEvent,
};
pub use model::{
    Chunk, CompressionAlgorithm, CompressionMeta, EncryptionMeta, KdfAlgorithm, KdfParams,
    Manifest, SubManifestRef,
};
