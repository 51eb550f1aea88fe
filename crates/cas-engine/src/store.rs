//! `Engine::store`: chunk, optionally compress and encrypt, and persist a
//! byte source as blobs, returning the resulting manifest.

use std::io::Read;

use cas_core::model::{Chunk, CompressionMeta, EncryptionMeta, KdfAlgorithm, ManifestFields};
use cas_core::event::{ChunkStoredEvent, FileStoredEvent};
use cas_core::{CasError, Manifest};

use crate::key_resolution::{resolve_for_store, KeyMaterial};
use crate::{compress, Engine};

/// Inputs to [`Engine::store`].
pub struct StoreInput {
    /// Byte source to store. Plain buffered reads stand in for a lazily
    /// produced byte sequence.
    pub source: Box<dyn Read + Send>,
    /// Caller-chosen logical identifier for the resulting manifest.
    pub slug: String,
    /// Original file name recorded in the manifest.
    pub filename: String,
    /// Raw key or passphrase; at most one may be set.
    pub key_material: KeyMaterial,
    /// KDF algorithm to use when `key_material.passphrase` is set. Defaults
    /// to PBKDF2 with [`crate::key_resolution::DEFAULT_PBKDF2_ITERATIONS`].
    pub kdf_algorithm: Option<KdfAlgorithm>,
    /// Whether to gzip-compress the source before chunking.
    pub compress: bool,
}

impl Engine {
    /// Chunk, optionally compress and encrypt, and persist `input.source`,
    /// returning the resulting manifest.
    ///
    /// Compression and encryption both require the full transformed buffer
    /// before chunking can begin (gzip framing and AES-256-GCM's one-shot
    /// tag both need the whole input), so that combination buffers the
    /// source in memory. The plaintext-only path — no compression, no key —
    /// reads and chunks incrementally, which keeps `StreamError`'s
    /// `chunks_written` count meaningful for the common case: a read
    /// failure after N chunks is reported as exactly N chunks written, not
    /// rounded down to zero by an unconditional buffering step.
    pub fn store(&self, input: StoreInput) -> Result<Manifest, CasError> {
        let span = tracing::info_span!("cas_engine::store", slug = %input.slug);
        let _guard = span.enter();

        let key = resolve_for_store(self.crypto.as_ref(), &input.key_material, input.kdf_algorithm)
            .map_err(|e| self.note_error(e))?;

        let (size, chunk_bytes, compression, encryption) = if input.compress || key.is_some() {
            self.buffer_transform(input.source, input.compress, key)?
        } else {
            return self.store_streaming(input.source, &input.slug, &input.filename);
        };

        let chunks = self.persist_chunks(&chunk_bytes, 0)?;
        let manifest = Manifest::new(ManifestFields {
            version: None,
            slug: input.slug.clone(),
            filename: input.filename,
            size,
            chunks,
            encryption,
            compression,
            sub_manifests: None,
        })
        .map_err(|e| self.note_error(e))?;

        self.emit_file_stored(&manifest);
        Ok(manifest)
    }

    fn buffer_transform(
        &self,
        mut source: Box<dyn Read + Send>,
        compress: bool,
        key: Option<(cas_crypto::Key, Option<cas_core::model::KdfParams>)>,
    ) -> Result<(u64, Vec<u8>, Option<CompressionMeta>, Option<EncryptionMeta>), CasError> {
        let mut raw = Vec::new();
        source
            .read_to_end(&mut raw)
            .map_err(|e| self.note_error(CasError::StreamError { chunks_written: 0, source: e }))?;
        let size = raw.len() as u64;

        let (transformed, compression) = if compress {
            (compress::gzip_compress(&raw)?, Some(CompressionMeta::gzip()))
        } else {
            (raw, None)
        };

        let (chunk_bytes, encryption) = match key {
            Some((key, kdf_params)) => {
                let (ciphertext, mut meta) = self.crypto.encrypt_buffer(&transformed, &key)?;
                meta.kdf = kdf_params;
                (ciphertext, Some(meta))
            }
            None => (transformed, None),
        };

        Ok((size, chunk_bytes, compression, encryption))
    }

    fn store_streaming(
        &self,
        mut source: Box<dyn Read + Send>,
        slug: &str,
        filename: &str,
    ) -> Result<Manifest, CasError> {
        let chunk_size = self.config.chunk_size();
        let mut chunks = Vec::new();
        let mut size = 0u64;
        let mut index = 0u64;
        let mut buf = vec![0u8; chunk_size];

        loop {
            let filled = read_fill(&mut source, &mut buf)
                .map_err(|e| self.note_error(CasError::StreamError { chunks_written: index, source: e }))?;
            if filled == 0 {
                break;
            }
            let chunk_bytes = &buf[..filled];
            let digest = self.crypto.sha256(chunk_bytes);
            let blob = self.persistence.write_blob(chunk_bytes).map_err(|e| self.note_error(e))?;
            let chunk = Chunk::new(index, filled as u64, digest.clone(), blob.clone()).map_err(|e| self.note_error(e))?;
            cas_core::event::observer().chunk_stored(&ChunkStoredEvent { index, size: filled as u64, digest, blob });
            chunks.push(chunk);
            size += filled as u64;
            index += 1;
            if filled < chunk_size {
                break;
            }
        }

        let manifest = Manifest::new(ManifestFields {
            version: None,
            slug: slug.to_string(),
            filename: filename.to_string(),
            size,
            chunks,
            encryption: None,
            compression: None,
            sub_manifests: None,
        })
        .map_err(|e| self.note_error(e))?;

        self.emit_file_stored(&manifest);
        Ok(manifest)
    }

    /// Split `bytes` into fixed-size chunks starting at `base_index`, writing
    /// each as a blob and emitting a `chunk:stored` event per chunk.
    pub(crate) fn persist_chunks(&self, bytes: &[u8], base_index: u64) -> Result<Vec<Chunk>, CasError> {
        let chunk_size = self.config.chunk_size();
        let mut chunks = Vec::new();
        for (i, slice) in bytes.chunks(chunk_size).enumerate() {
            let index = base_index + i as u64;
            let digest = self.crypto.sha256(slice);
            let blob = self.persistence.write_blob(slice).map_err(|e| self.note_error(e))?;
            let chunk =
                Chunk::new(index, slice.len() as u64, digest.clone(), blob.clone()).map_err(|e| self.note_error(e))?;
            cas_core::event::observer()
                .chunk_stored(&ChunkStoredEvent { index, size: slice.len() as u64, digest, blob });
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    fn emit_file_stored(&self, manifest: &Manifest) {
        tracing::debug!(slug = manifest.slug(), chunks = manifest.chunks().len(), "file stored");
        cas_core::event::observer().file_stored(&FileStoredEvent {
            slug: manifest.slug().to_string(),
            size: manifest.size(),
            chunk_count: manifest.chunks().len() as u64,
            encrypted: manifest.is_encrypted(),
        });
    }

    /// Report an error to the installed observer, if any, and pass it
    /// through unchanged.
    pub(crate) fn note_error(&self, err: CasError) -> CasError {
        if cas_core::event::has_observer() {
            cas_core::event::observer().error(err.code(), &err.to_string());
        }
        err
    }
}

/// Read into `buf` until it is full or the source is exhausted, returning
/// the number of bytes filled. Unlike a single `read` call this tolerates
/// short reads, which `Read` implementations are free to return.
fn read_fill(source: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use cas_codec::JsonCodec;
    use cas_crypto::DefaultCrypto;
    use cas_persistence::InMemoryPersistence;

    use crate::{Engine, EngineConfig};

    fn engine() -> Engine {
        Engine::new(
            Arc::new(InMemoryPersistence::new()),
            Arc::new(DefaultCrypto),
            Arc::new(JsonCodec),
            EngineConfig::builder().build().unwrap(),
        )
    }

    #[test]
    fn stores_plaintext_single_chunk() {
        let engine = engine();
        let manifest = engine
            .store(StoreInput {
                source: Box::new(Cursor::new(b"hello world".to_vec())),
                slug: "greeting".into(),
                filename: "greeting.txt".into(),
                key_material: KeyMaterial::default(),
                kdf_algorithm: None,
                compress: false,
            })
            .unwrap();
        assert_eq!(manifest.size(), 11);
        assert_eq!(manifest.chunks().len(), 1);
        assert!(!manifest.is_encrypted());
    }

    #[test]
    fn empty_input_yields_zero_chunks() {
        let engine = engine();
        let manifest = engine
            .store(StoreInput {
                source: Box::new(Cursor::new(Vec::new())),
                slug: "empty".into(),
                filename: "empty.bin".into(),
                key_material: KeyMaterial::default(),
                kdf_algorithm: None,
                compress: false,
            })
            .unwrap();
        assert_eq!(manifest.size(), 0);
        assert!(manifest.chunks().is_empty());
    }

    #[test]
    fn multi_chunk_plaintext_splits_on_boundary() {
        let engine = Engine::new(
            Arc::new(InMemoryPersistence::new()),
            Arc::new(DefaultCrypto),
            Arc::new(JsonCodec),
            EngineConfig::builder().chunk_size(1024).build().unwrap(),
        );
        let data = vec![0xAAu8; 1024 * 3];
        let manifest = engine
            .store(StoreInput {
                source: Box::new(Cursor::new(data)),
                slug: "triple".into(),
                filename: "triple.bin".into(),
                key_material: KeyMaterial::default(),
                kdf_algorithm: None,
                compress: false,
            })
            .unwrap();
        assert_eq!(manifest.chunks().len(), 3);
        assert!(manifest.chunks().iter().all(|c| c.size() == 1024));
    }

    #[test]
    fn encrypted_store_records_kdf_when_passphrase_used() {
        let engine = engine();
        let manifest = engine
            .store(StoreInput {
                source: Box::new(Cursor::new(b"top secret".to_vec())),
                slug: "secret".into(),
                filename: "secret.bin".into(),
                key_material: KeyMaterial { key: None, passphrase: Some(b"hunter2".to_vec()) },
                kdf_algorithm: None,
                compress: false,
            })
            .unwrap();
        assert!(manifest.is_encrypted());
        assert!(manifest.encryption().unwrap().kdf.is_some());
    }

    #[test]
    fn rejects_both_key_and_passphrase() {
        let engine = engine();
        let err = engine
            .store(StoreInput {
                source: Box::new(Cursor::new(b"x".to_vec())),
                slug: "s".into(),
                filename: "f".into(),
                key_material: KeyMaterial { key: Some(vec![1u8; 32]), passphrase: Some(b"pw".to_vec()) },
                kdf_algorithm: None,
                compress: false,
            })
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_MANIFEST");
    }
}
