//! Validated, immutable value records for the on-disk model.
//!
//! Every record here is constructed only through a validating factory
//! function and has no public mutating methods — once built, a `Chunk` or a
//! `Manifest` is frozen for the rest of its lifetime.

use serde::{Deserialize, Serialize};

use crate::error::CasError;

fn is_lowercase_hex_64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// One fixed-size (or final, shorter) window of a logical file, stored as a
/// single blob in the object database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    index: u64,
    size: u64,
    digest: String,
    blob: String,
}

impl Chunk {
    /// Construct a chunk, validating the digest shape and the non-empty blob
    /// OID. Does **not** verify that `digest` actually matches the blob's
    /// content — that check happens against the persistence port, which is
    /// the only component that can read the blob back.
    pub fn new(index: u64, size: u64, digest: impl Into<String>, blob: impl Into<String>) -> Result<Self, CasError> {
        let digest = digest.into();
        let blob = blob.into();
        if size == 0 {
            return Err(CasError::InvalidManifest("chunk size must be positive".into()));
        }
        if !is_lowercase_hex_64(&digest) {
            return Err(CasError::InvalidManifest(format!(
                "chunk digest must be 64 lowercase hex chars, got {digest:?}"
            )));
        }
        if blob.is_empty() {
            return Err(CasError::InvalidManifest("chunk blob oid must be non-empty".into()));
        }
        Ok(Self { index, size, digest, blob })
    }

    /// Zero-based position of this chunk within its manifest's chunk list.
    #[must_use]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Size in bytes of this chunk's stored content.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// 64-char lowercase hex SHA-256 digest of this chunk's stored bytes.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// OID of the blob holding this chunk's bytes.
    #[must_use]
    pub fn blob(&self) -> &str {
        &self.blob
    }
}

/// Symmetric-key derivation algorithm used to turn a passphrase into a
/// 32-byte key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum KdfAlgorithm {
    /// PBKDF2-HMAC-SHA256.
    Pbkdf2 {
        /// Iteration count.
        iterations: u32,
    },
    /// scrypt.
    Scrypt {
        /// CPU/memory cost parameter (must be a power of two).
        cost: u32,
        /// Block size parameter.
        block_size: u32,
        /// Parallelization parameter.
        parallelization: u32,
    },
}

/// Parameters recorded alongside a passphrase-derived key so the same key can
/// be re-derived at restore time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Algorithm and its tuning parameters.
    #[serde(flatten)]
    pub algorithm: KdfAlgorithm,
    /// Base64-encoded 32-byte random salt.
    pub salt: String,
    /// Length in bytes of the derived key (default 32).
    pub key_length: usize,
}

impl KdfParams {
    /// Construct KDF params, validating the salt shape and key length.
    pub fn new(algorithm: KdfAlgorithm, salt: impl Into<String>, key_length: usize) -> Result<Self, CasError> {
        use base64::Engine as _;
        let salt = salt.into();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&salt)
            .map_err(|e| CasError::InvalidManifest(format!("kdf salt is not valid base64: {e}")))?;
        if decoded.len() != 32 {
            return Err(CasError::InvalidManifest(format!(
                "kdf salt must decode to 32 bytes, got {}",
                decoded.len()
            )));
        }
        if key_length == 0 {
            return Err(CasError::InvalidManifest("kdf key_length must be positive".into()));
        }
        Ok(Self { algorithm, salt, key_length })
    }
}

/// Encryption metadata attached to a manifest when its chunks are
/// AES-256-GCM ciphertext rather than plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionMeta {
    algorithm: String,
    nonce: String,
    tag: String,
    encrypted: bool,
    /// KDF parameters, present only when the key was passphrase-derived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kdf: Option<KdfParams>,
}

impl EncryptionMeta {
    /// Construct encryption metadata, validating the nonce (12 bytes) and tag
    /// (16 bytes) shapes.
    pub fn new(nonce: impl Into<String>, tag: impl Into<String>, kdf: Option<KdfParams>) -> Result<Self, CasError> {
        use base64::Engine as _;
        let nonce = nonce.into();
        let tag = tag.into();
        let nonce_len = base64::engine::general_purpose::STANDARD
            .decode(&nonce)
            .map_err(|e| CasError::InvalidManifest(format!("nonce is not valid base64: {e}")))?
            .len();
        if nonce_len != 12 {
            return Err(CasError::InvalidManifest(format!("nonce must decode to 12 bytes, got {nonce_len}")));
        }
        let tag_len = base64::engine::general_purpose::STANDARD
            .decode(&tag)
            .map_err(|e| CasError::InvalidManifest(format!("tag is not valid base64: {e}")))?
            .len();
        if tag_len != 16 {
            return Err(CasError::InvalidManifest(format!("tag must decode to 16 bytes, got {tag_len}")));
        }
        Ok(Self { algorithm: "aes-256-gcm".to_string(), nonce, tag, encrypted: true, kdf })
    }

    /// Fixed algorithm identifier, always `"aes-256-gcm"`.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Base64-encoded 12-byte nonce, freshly random per encryption.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Base64-encoded 16-byte AEAD authentication tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether the chunks this metadata accompanies are ciphertext.
    #[must_use]
    pub fn encrypted(&self) -> bool {
        self.encrypted
    }
}

/// Compression algorithm applied before chunking. Only `gzip` exists today;
/// the type is additive so future algorithms can be added as new variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    /// DEFLATE framed as gzip.
    Gzip,
}

/// Compression metadata attached to a manifest when its plaintext was
/// compressed before chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionMeta {
    /// Algorithm used.
    pub algorithm: CompressionAlgorithm,
}

impl CompressionMeta {
    /// Construct gzip compression metadata.
    #[must_use]
    pub fn gzip() -> Self {
        Self { algorithm: CompressionAlgorithm::Gzip }
    }
}

/// Reference to a sub-manifest blob holding a contiguous slice of a parent
/// manifest's chunk sequence (Merkle form, manifest version 2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubManifestRef {
    oid: String,
    chunk_count: u64,
    start_index: u64,
}

impl SubManifestRef {
    /// Construct a sub-manifest reference, validating the non-empty OID and
    /// positive chunk count.
    pub fn new(oid: impl Into<String>, chunk_count: u64, start_index: u64) -> Result<Self, CasError> {
        let oid = oid.into();
        if oid.is_empty() {
            return Err(CasError::InvalidManifest("sub-manifest oid must be non-empty".into()));
        }
        if chunk_count == 0 {
            return Err(CasError::InvalidManifest("sub-manifest chunk_count must be positive".into()));
        }
        Ok(Self { oid, chunk_count, start_index })
    }

    /// OID of the sub-manifest blob.
    #[must_use]
    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// Number of chunks this sub-manifest carries.
    #[must_use]
    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    /// Index of the first chunk in this sub-manifest within the logical
    /// (flattened) chunk sequence.
    #[must_use]
    pub fn start_index(&self) -> u64 {
        self.start_index
    }
}

/// A validated record describing a logical file's identity, original size
/// and ordered chunk list — the unit persisted as `manifest.<ext>` in a
/// tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    version: u8,
    slug: String,
    filename: String,
    size: u64,
    chunks: Vec<Chunk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encryption: Option<EncryptionMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<CompressionMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub_manifests: Option<Vec<SubManifestRef>>,
}

/// Inputs to [`Manifest::new`], grouped since the constructor takes more
/// fields than reads comfortably as a positional argument list.
#[derive(Debug, Default)]
pub struct ManifestFields {
    /// Manifest version; `None` defaults to `1`.
    pub version: Option<u8>,
    /// Caller-chosen logical identifier.
    pub slug: String,
    /// Original file name.
    pub filename: String,
    /// Total plaintext byte count.
    pub size: u64,
    /// Ordered chunk list (empty for a v2 Merkle root).
    pub chunks: Vec<Chunk>,
    /// Encryption metadata, if the content is encrypted.
    pub encryption: Option<EncryptionMeta>,
    /// Compression metadata, if the content was compressed.
    pub compression: Option<CompressionMeta>,
    /// Sub-manifest references, present only for a v2 Merkle root.
    pub sub_manifests: Option<Vec<SubManifestRef>>,
}

impl Manifest {
    /// Construct a manifest, enforcing every invariant from the data model:
    /// chunk index contiguity, the "v2 roots carry no direct chunks"
    /// constraint, and sub-manifest chunk-count/start-index bookkeeping.
    pub fn new(fields: ManifestFields) -> Result<Self, CasError> {
        let ManifestFields { version, slug, filename, size, chunks, encryption, compression, sub_manifests } = fields;
        let version = version.unwrap_or(1);
        if version != 1 && version != 2 {
            return Err(CasError::InvalidManifest(format!("unsupported manifest version {version}")));
        }
        if slug.is_empty() {
            return Err(CasError::InvalidManifest("slug must be non-empty".into()));
        }
        if filename.is_empty() {
            return Err(CasError::InvalidManifest("filename must be non-empty".into()));
        }
        // Chunk indices are contiguous from the first chunk's index, not
        // necessarily from zero: a sub-manifest's chunks carry their global
        // index within the parent's flattened sequence (e.g. a second
        // Merkle group's chunks start at its `start_index`, not at 0).
        if let Some(first) = chunks.first() {
            let base = first.index();
            for (i, c) in chunks.iter().enumerate() {
                let expected = base + i as u64;
                if c.index() != expected {
                    return Err(CasError::InvalidManifest(format!(
                        "chunk at position {i} has index {}, expected {expected}",
                        c.index()
                    )));
                }
            }
        }
        if let Some(subs) = &sub_manifests {
            if !chunks.is_empty() {
                return Err(CasError::InvalidManifest(
                    "a manifest with sub_manifests must have an empty chunks list".into(),
                ));
            }
            let mut expected_start = 0u64;
            for s in subs {
                if s.start_index() != expected_start {
                    return Err(CasError::InvalidManifest(format!(
                        "sub-manifest {} has start_index {}, expected {expected_start}",
                        s.oid(),
                        s.start_index()
                    )));
                }
                expected_start += s.chunk_count();
            }
        }
        Ok(Self { version, slug, filename, size, chunks, encryption, compression, sub_manifests })
    }

    /// Manifest schema version (`1` flat, `2` Merkle root).
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Caller-chosen logical identifier for the stored asset.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Original file name.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Total plaintext (decrypted, decompressed) byte count.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Ordered chunk list. Empty for a v2 Merkle root.
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Encryption metadata, present iff the content is encrypted.
    #[must_use]
    pub fn encryption(&self) -> Option<&EncryptionMeta> {
        self.encryption.as_ref()
    }

    /// Compression metadata, present iff the content was compressed.
    #[must_use]
    pub fn compression(&self) -> Option<&CompressionMeta> {
        self.compression.as_ref()
    }

    /// Sub-manifest references, present only for a v2 Merkle root.
    #[must_use]
    pub fn sub_manifests(&self) -> Option<&[SubManifestRef]> {
        self.sub_manifests.as_deref()
    }

    /// Whether this manifest is encrypted per its [`EncryptionMeta`].
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.encryption.as_ref().is_some_and(EncryptionMeta::encrypted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest_of(b: &[u8]) -> String {
        use sha2::{Digest as _, Sha256};
        hex::encode(Sha256::digest(b))
    }

    #[test]
    fn chunk_rejects_short_digest() {
        let err = Chunk::new(0, 4, "abcd", "blob1").unwrap_err();
        assert_eq!(err.code(), "INVALID_MANIFEST");
    }

    #[test]
    fn chunk_rejects_zero_size() {
        let digest = digest_of(b"x");
        assert!(Chunk::new(0, 0, digest, "blob1").is_err());
    }

    #[test]
    fn manifest_rejects_index_gap() {
        let c0 = Chunk::new(0, 4, digest_of(b"aaaa"), "b0").unwrap();
        let c1 = Chunk::new(2, 4, digest_of(b"bbbb"), "b1").unwrap();
        let err = Manifest::new(ManifestFields {
            slug: "s".into(),
            filename: "f".into(),
            size: 8,
            chunks: vec![c0, c1],
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_MANIFEST");
    }

    #[test]
    fn manifest_rejects_chunks_with_submanifests() {
        let c0 = Chunk::new(0, 4, digest_of(b"aaaa"), "b0").unwrap();
        let sub = SubManifestRef::new("sub-oid", 4, 0).unwrap();
        let err = Manifest::new(ManifestFields {
            version: Some(2),
            slug: "s".into(),
            filename: "f".into(),
            size: 4,
            chunks: vec![c0],
            sub_manifests: Some(vec![sub]),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_MANIFEST");
    }

    #[test]
    fn manifest_rejects_bad_start_index() {
        let sub0 = SubManifestRef::new("sub-0", 5, 0).unwrap();
        let sub1 = SubManifestRef::new("sub-1", 5, 6).unwrap();
        let err = Manifest::new(ManifestFields {
            version: Some(2),
            slug: "s".into(),
            filename: "f".into(),
            size: 10,
            sub_manifests: Some(vec![sub0, sub1]),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_MANIFEST");
    }

    #[test]
    fn encryption_meta_requires_valid_nonce_and_tag_lengths() {
        use base64::Engine as _;
        let nonce = base64::engine::general_purpose::STANDARD.encode([0u8; 12]);
        let bad_tag = base64::engine::general_purpose::STANDARD.encode([0u8; 8]);
        assert!(EncryptionMeta::new(nonce, bad_tag, None).is_err());
    }
}
