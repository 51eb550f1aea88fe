//! `Engine::create_tree`/`Engine::read_manifest`: persisting a manifest as a
//! tree (splitting into a Merkle (v2) root above the configured threshold)
//! and expanding one back into a flat (v1-shaped) manifest.

use cas_core::model::{ManifestFields, SubManifestRef};
use cas_core::{CasError, Manifest};
use cas_persistence::TreeEntryLine;

use crate::Engine;

impl Engine {
    /// Persist `manifest` as a tree, returning its OID.
    ///
    /// A manifest whose chunk count exceeds `merkle_threshold` is split: each
    /// group of up to `merkle_threshold` chunks becomes its own v1 child
    /// manifest, encoded and written as a blob, and the root tree carries a
    /// version-2 manifest referencing those blobs by OID instead of the
    /// chunks directly. A chunk count exactly at the threshold stays v1 —
    /// the split is strictly `>`.
    pub fn create_tree(&self, manifest: &Manifest) -> Result<String, CasError> {
        let threshold = self.config.merkle_threshold();
        if manifest.chunks().len() > threshold {
            return self.create_merkle_tree(manifest, threshold);
        }

        let manifest_name = format!("manifest.{}", self.codec.extension());
        let manifest_bytes = self.codec.encode(manifest)?;
        let manifest_oid = self.persistence.write_blob(&manifest_bytes).map_err(|e| self.note_error(e))?;

        let mut entries = vec![TreeEntryLine::blob(manifest_oid, manifest_name)];
        for chunk in manifest.chunks() {
            entries.push(TreeEntryLine::blob(chunk.blob().to_string(), chunk.digest().to_string()));
        }
        self.persistence.write_tree(&entries).map_err(|e| self.note_error(e))
    }

    fn create_merkle_tree(&self, manifest: &Manifest, threshold: usize) -> Result<String, CasError> {
        let mut sub_manifests = Vec::new();
        for group in manifest.chunks().chunks(threshold) {
            let start_index = group.first().map(cas_core::model::Chunk::index).unwrap_or(0);
            let group_size: u64 = group.iter().map(cas_core::model::Chunk::size).sum();
            let child = Manifest::new(ManifestFields {
                version: None,
                slug: manifest.slug().to_string(),
                filename: manifest.filename().to_string(),
                size: group_size,
                chunks: group.to_vec(),
                encryption: None,
                compression: None,
                sub_manifests: None,
            })
            .map_err(|e| self.note_error(e))?;
            let child_bytes = self.codec.encode(&child)?;
            let child_oid = self.persistence.write_blob(&child_bytes).map_err(|e| self.note_error(e))?;
            let sub_ref =
                SubManifestRef::new(child_oid, group.len() as u64, start_index).map_err(|e| self.note_error(e))?;
            sub_manifests.push(sub_ref);
        }

        let root = Manifest::new(ManifestFields {
            version: Some(2),
            slug: manifest.slug().to_string(),
            filename: manifest.filename().to_string(),
            size: manifest.size(),
            chunks: Vec::new(),
            encryption: manifest.encryption().cloned(),
            compression: manifest.compression().cloned(),
            sub_manifests: Some(sub_manifests),
        })
        .map_err(|e| self.note_error(e))?;

        let manifest_name = format!("manifest.{}", self.codec.extension());
        let root_bytes = self.codec.encode(&root)?;
        let root_oid = self.persistence.write_blob(&root_bytes).map_err(|e| self.note_error(e))?;
        self.persistence
            .write_tree(&[TreeEntryLine::blob(root_oid, manifest_name)])
            .map_err(|e| self.note_error(e))
    }

    /// Read a tree back into a flat (v1-shaped) manifest, expanding a v2
    /// Merkle root by concatenating its sub-manifests' chunk arrays in order
    /// and asserting their `start_index`/`chunk_count` bookkeeping matches
    /// what the root's `SubManifestRef`s claim.
    pub fn read_manifest(&self, tree_oid: &str) -> Result<Manifest, CasError> {
        let entries = self.persistence.read_tree(tree_oid).map_err(|e| self.note_error(e))?;
        let manifest_name = format!("manifest.{}", self.codec.extension());
        let entry = entries.iter().find(|e| e.name == manifest_name).ok_or_else(|| {
            self.note_error(CasError::ManifestNotFound {
                tree_oid: tree_oid.to_string(),
                expected_name: manifest_name.clone(),
            })
        })?;
        let manifest_bytes = self.persistence.read_blob(&entry.oid).map_err(|e| self.note_error(e))?;
        let manifest = self.codec.decode(&manifest_bytes)?;

        if manifest.version() == 1 {
            return Ok(manifest);
        }

        let subs = manifest.sub_manifests().ok_or_else(|| {
            self.note_error(CasError::InvalidManifest(format!(
                "version 2 manifest {tree_oid} carries no sub_manifests"
            )))
        })?;

        let mut chunks = Vec::new();
        for sub in subs {
            let sub_bytes = self.persistence.read_blob(sub.oid()).map_err(|e| self.note_error(e))?;
            let sub_manifest = self.codec.decode(&sub_bytes)?;
            let first_index = sub_manifest.chunks().first().map(cas_core::model::Chunk::index);
            if sub_manifest.chunks().len() as u64 != sub.chunk_count() || first_index != Some(sub.start_index()) {
                return Err(self.note_error(CasError::MerkleMismatch {
                    oid: sub.oid().to_string(),
                    detail: format!(
                        "expected {} chunks starting at index {}, got {} chunks starting at {:?}",
                        sub.chunk_count(),
                        sub.start_index(),
                        sub_manifest.chunks().len(),
                        first_index
                    ),
                }));
            }
            chunks.extend(sub_manifest.chunks().iter().cloned());
        }

        Manifest::new(ManifestFields {
            version: None,
            slug: manifest.slug().to_string(),
            filename: manifest.filename().to_string(),
            size: manifest.size(),
            chunks,
            encryption: manifest.encryption().cloned(),
            compression: manifest.compression().cloned(),
            sub_manifests: None,
        })
        .map_err(|e| self.note_error(e))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use cas_codec::JsonCodec;
    use cas_crypto::DefaultCrypto;
    use cas_persistence::InMemoryPersistence;

    use crate::key_resolution::KeyMaterial;
    use crate::store::StoreInput;
    use crate::{Engine, EngineConfig};

    fn engine_with_threshold(chunk_size: usize, merkle_threshold: usize) -> Engine {
        Engine::new(
            Arc::new(InMemoryPersistence::new()),
            Arc::new(DefaultCrypto),
            Arc::new(JsonCodec),
            EngineConfig::builder().chunk_size(chunk_size).merkle_threshold(merkle_threshold).build().unwrap(),
        )
    }

    #[test]
    fn small_manifest_stays_v1() {
        let engine = engine_with_threshold(1024, 5);
        let manifest = engine
            .store(StoreInput {
                source: Box::new(Cursor::new(vec![0xAAu8; 1024 * 3])),
                slug: "asset".into(),
                filename: "asset.bin".into(),
                key_material: KeyMaterial::default(),
                kdf_algorithm: None,
                compress: false,
            })
            .unwrap();
        let tree_oid = engine.create_tree(&manifest).unwrap();
        let read_back = engine.read_manifest(&tree_oid).unwrap();
        assert_eq!(read_back.version(), 1);
        assert_eq!(read_back, manifest);
    }

    #[test]
    fn exactly_at_threshold_stays_v1() {
        let engine = engine_with_threshold(1024, 3);
        let manifest = engine
            .store(StoreInput {
                source: Box::new(Cursor::new(vec![0xBBu8; 1024 * 3])),
                slug: "asset".into(),
                filename: "asset.bin".into(),
                key_material: KeyMaterial::default(),
                kdf_algorithm: None,
                compress: false,
            })
            .unwrap();
        assert_eq!(manifest.chunks().len(), 3);
        let tree_oid = engine.create_tree(&manifest).unwrap();
        let read_back = engine.read_manifest(&tree_oid).unwrap();
        assert_eq!(read_back.version(), 1);
    }

    #[test]
    fn twelve_chunks_threshold_five_splits_into_five_five_two() {
        let engine = engine_with_threshold(1024, 5);
        let manifest = engine
            .store(StoreInput {
                source: Box::new(Cursor::new(vec![0xCCu8; 1024 * 12])),
                slug: "big".into(),
                filename: "big.bin".into(),
                key_material: KeyMaterial::default(),
                kdf_algorithm: None,
                compress: false,
            })
            .unwrap();
        assert_eq!(manifest.chunks().len(), 12);

        let tree_oid = engine.create_tree(&manifest).unwrap();
        let read_back = engine.read_manifest(&tree_oid).unwrap();
        assert_eq!(read_back.version(), 1);
        assert_eq!(read_back.chunks().len(), 12);
        assert_eq!(read_back.chunks(), manifest.chunks());
    }
}
