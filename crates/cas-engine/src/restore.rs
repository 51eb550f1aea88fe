//! `Engine::restore`: read a manifest's chunks back, verify their digests,
//! decrypt and decompress in the reverse of `store`'s pipeline order.

use cas_core::event::{ChunkRestoredEvent, FileRestoredEvent};
use cas_core::{CasError, Manifest};

use crate::key_resolution::{resolve_for_restore, KeyMaterial};
use crate::{compress, Engine};

/// Inputs to [`Engine::restore`].
pub struct RestoreInput {
    /// The manifest to restore (typically from [`Engine::read_manifest`]).
    pub manifest: Manifest,
    /// Raw key or passphrase; at most one may be set. Required iff
    /// `manifest.is_encrypted()`.
    pub key_material: KeyMaterial,
}

/// The restored asset: its identity plus the recovered plaintext bytes.
pub struct RestoreOutput {
    /// The manifest's logical identifier.
    pub slug: String,
    /// The manifest's original file name.
    pub filename: String,
    /// Recovered plaintext (decrypted, decompressed) bytes.
    pub bytes: Vec<u8>,
}

impl Engine {
    /// Restore a manifest's original bytes: read every chunk in order,
    /// verify its digest, then decrypt (if encrypted) and decompress (if
    /// compressed) — the exact reverse of `store`'s transform order.
    pub fn restore(&self, input: RestoreInput) -> Result<RestoreOutput, CasError> {
        let manifest = input.manifest;
        let span = tracing::info_span!("cas_engine::restore", slug = manifest.slug());
        let _guard = span.enter();

        let manifest_kdf = manifest.encryption().and_then(|e| e.kdf.as_ref());
        let key = resolve_for_restore(self.crypto.as_ref(), &input.key_material, manifest_kdf)
            .map_err(|e| self.note_error(e))?;

        if manifest.is_encrypted() && key.is_none() {
            return Err(self.note_error(CasError::MissingKey));
        }

        if manifest.chunks().is_empty() {
            self.emit_file_restored(&manifest);
            return Ok(RestoreOutput {
                slug: manifest.slug().to_string(),
                filename: manifest.filename().to_string(),
                bytes: Vec::new(),
            });
        }

        let mut combined = Vec::new();
        for chunk in manifest.chunks() {
            let bytes = self.persistence.read_blob(chunk.blob()).map_err(|e| self.note_error(e))?;
            let actual = self.crypto.sha256(&bytes);
            if actual != chunk.digest() {
                return Err(self.note_error(CasError::IntegrityError {
                    chunk_index: chunk.index(),
                    expected: chunk.digest().to_string(),
                    actual,
                }));
            }
            cas_core::event::observer().chunk_restored(&ChunkRestoredEvent {
                index: chunk.index(),
                size: chunk.size(),
                digest: actual,
            });
            combined.extend_from_slice(&bytes);
        }

        let decrypted = match (&key, manifest.encryption()) {
            (Some(key), Some(meta)) => self.crypto.decrypt_buffer(&combined, key, meta)?,
            _ => combined,
        };

        let plain = match manifest.compression() {
            Some(_) => compress::gzip_decompress(&decrypted)?,
            None => decrypted,
        };

        self.emit_file_restored(&manifest);
        Ok(RestoreOutput { slug: manifest.slug().to_string(), filename: manifest.filename().to_string(), bytes: plain })
    }

    fn emit_file_restored(&self, manifest: &Manifest) {
        tracing::debug!(slug = manifest.slug(), chunks = manifest.chunks().len(), "file restored");
        cas_core::event::observer().file_restored(&FileRestoredEvent {
            slug: manifest.slug().to_string(),
            size: manifest.size(),
            chunk_count: manifest.chunks().len() as u64,
        });
    }
}
