//! Read-only maintenance operations: integrity verification, delete-asset
//! accounting and cross-manifest chunk reference collection.
//!
//! None of these mutate the persistence port — physical reclamation and
//! ref-level deletion stay out of scope here, so these operations only ever
//! compute and report, leaving the destructive act to an external
//! collaborator.

use std::collections::HashSet;

use cas_core::event::IntegrityFailEvent;
use cas_core::{CasError, Manifest};

use crate::Engine;

/// Result of [`Engine::delete_asset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteAssetResult {
    /// The manifest's logical identifier.
    pub slug: String,
    /// Number of chunks this manifest alone referenced, and so would become
    /// orphaned if its tree reference were dropped elsewhere.
    pub chunks_orphaned: u64,
}

/// Result of [`Engine::find_orphaned_chunks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOrphanedChunksResult {
    /// Blob OIDs referenced by at least one of the supplied manifests.
    pub referenced: HashSet<String>,
    /// Number of chunks visited across every manifest, including repeat
    /// visits to the same blob OID from different manifests — distinct from
    /// `referenced.len()`, which counts only the deduped set.
    pub total: usize,
}

impl Engine {
    /// Recompute every chunk's digest against its stored blob and compare it
    /// to the manifest's recorded digest. Never errors on a mismatch — a
    /// digest failure is a reportable fact about the data, not a fault in
    /// the read path itself. A blob that cannot be read at all counts as a
    /// failed chunk.
    #[must_use]
    pub fn verify_integrity(&self, manifest: &Manifest) -> bool {
        let mut all_ok = true;
        for chunk in manifest.chunks() {
            let actual = match self.persistence.read_blob(chunk.blob()) {
                Ok(bytes) => self.crypto.sha256(&bytes),
                Err(_) => String::new(),
            };
            if actual != chunk.digest() {
                all_ok = false;
                cas_core::event::observer().integrity_fail(&IntegrityFailEvent {
                    slug: manifest.slug().to_string(),
                    chunk_index: chunk.index(),
                    expected: chunk.digest().to_string(),
                    actual,
                });
            }
        }
        if all_ok {
            cas_core::event::observer().integrity_pass(manifest.slug());
        }
        all_ok
    }

    /// Report how many chunks this manifest alone referenced. Performs no
    /// destructive action — removing the manifest's tree reference (and any
    /// eventual garbage collection of now-unreferenced blobs) is the host
    /// object database's responsibility, external to this engine.
    #[must_use]
    pub fn delete_asset(&self, manifest: &Manifest) -> DeleteAssetResult {
        DeleteAssetResult { slug: manifest.slug().to_string(), chunks_orphaned: manifest.chunks().len() as u64 }
    }

    /// Collect the set of blob OIDs referenced by every manifest reachable
    /// from `tree_oids`. Fails closed: if any tree lacks a `manifest.<ext>`
    /// entry, the whole call fails rather than silently under-reporting
    /// references.
    pub fn find_orphaned_chunks(&self, tree_oids: &[String]) -> Result<FindOrphanedChunksResult, CasError> {
        let mut referenced = HashSet::new();
        let mut total = 0usize;
        for tree_oid in tree_oids {
            let manifest = self.read_manifest(tree_oid)?;
            for chunk in manifest.chunks() {
                total += 1;
                referenced.insert(chunk.blob().to_string());
            }
        }
        Ok(FindOrphanedChunksResult { referenced, total })
    }
}
