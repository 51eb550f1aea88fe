//! Engine event surface, consumed by external observers such as a
//! progress-bar layer.
//!
//! A trait with no-op default method bodies so an embedder overrides only
//! the events it cares about, plus a process-wide `OnceLock` slot for
//! registering a single global observer.

use std::sync::OnceLock;

/// Emitted once per chunk written during `store`, in strict index order.
#[derive(Debug, Clone)]
pub struct ChunkStoredEvent {
    /// Position of the chunk within the manifest's chunk list.
    pub index: u64,
    /// Size in bytes of the chunk.
    pub size: u64,
    /// 64-char lowercase hex digest of the chunk's bytes.
    pub digest: String,
    /// OID of the blob the chunk was written to.
    pub blob: String,
}

/// Emitted once per chunk read during `restore`, in strict index order.
#[derive(Debug, Clone)]
pub struct ChunkRestoredEvent {
    /// Position of the chunk within the manifest's chunk list.
    pub index: u64,
    /// Size in bytes of the chunk.
    pub size: u64,
    /// 64-char lowercase hex digest of the chunk's bytes.
    pub digest: String,
}

/// Emitted exactly once after `store` succeeds, following the final chunk
/// write and encryption finalization.
#[derive(Debug, Clone)]
pub struct FileStoredEvent {
    /// Logical identifier of the stored asset.
    pub slug: String,
    /// Total plaintext byte count.
    pub size: u64,
    /// Number of chunks written.
    pub chunk_count: u64,
    /// Whether the stored content is encrypted.
    pub encrypted: bool,
}

/// Emitted exactly once after `restore` succeeds.
#[derive(Debug, Clone)]
pub struct FileRestoredEvent {
    /// Logical identifier of the restored asset.
    pub slug: String,
    /// Total plaintext byte count.
    pub size: u64,
    /// Number of chunks read.
    pub chunk_count: u64,
}

/// Emitted when `verify_integrity` finds a chunk digest mismatch.
#[derive(Debug, Clone)]
pub struct IntegrityFailEvent {
    /// Logical identifier of the asset being verified.
    pub slug: String,
    /// Index of the offending chunk.
    pub chunk_index: u64,
    /// Digest recorded in the manifest.
    pub expected: String,
    /// Digest recomputed from the stored blob.
    pub actual: String,
}

/// Optional observability hooks for engine operations. By default every
/// method is a no-op; override only what you need.
pub trait EngineObserver: Send + Sync {
    /// A chunk was written during `store`.
    fn chunk_stored(&self, _event: &ChunkStoredEvent) {}
    /// A chunk was read and verified during `restore`.
    fn chunk_restored(&self, _event: &ChunkRestoredEvent) {}
    /// `store` completed successfully.
    fn file_stored(&self, _event: &FileStoredEvent) {}
    /// `restore` completed successfully.
    fn file_restored(&self, _event: &FileRestoredEvent) {}
    /// `verify_integrity` found every chunk intact.
    fn integrity_pass(&self, _slug: &str) {}
    /// `verify_integrity` found a chunk digest mismatch.
    fn integrity_fail(&self, _event: &IntegrityFailEvent) {}
    /// An operation failed. Emitted at most once per failure, and only if an
    /// observer other than the no-op default has been installed.
    fn error(&self, _code: &str, _message: &str) {}
}

struct NoopObserver;
impl EngineObserver for NoopObserver {}

static NOOP_OBSERVER: NoopObserver = NoopObserver;
static OBSERVER: OnceLock<&'static dyn EngineObserver> = OnceLock::new();

/// Register a global engine observer. Safe to call at most once; subsequent
/// calls are ignored.
pub fn set_observer(observer: &'static dyn EngineObserver) {
    let _ = OBSERVER.set(observer);
}

/// Whether a non-default observer has been installed. Used by the engine to
/// decide whether an `error` event is worth emitting at all: only if at
/// least one error listener is actually attached.
#[must_use]
pub fn has_observer() -> bool {
    OBSERVER.get().is_some()
}

/// The currently installed observer, or a no-op default.
#[must_use]
pub fn observer() -> &'static dyn EngineObserver {
    OBSERVER.get().copied().unwrap_or(&NOOP_OBSERVER)
}
