//! The CAS error taxonomy.
//!
//! Every fallible operation in this workspace returns a [`CasError`]. Typed
//! variants pass through engine boundaries untouched; raw errors from ports
//! (persistence I/O, source reads, decryption) are wrapped into the variant
//! that matches their cause, never swallowed into a generic catch-all.

/// The complete error taxonomy for the chunked content-addressable store.
#[derive(Debug, thiserror::Error)]
pub enum CasError {
    /// Key material was not a raw byte container of the expected shape.
    #[error("invalid key type: expected raw byte key material")]
    InvalidKeyType,

    /// Key material was present but not exactly 32 bytes.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Required key length in bytes (always 32 today).
        expected: usize,
        /// Actual length supplied.
        actual: usize,
    },

    /// The manifest is encrypted but no key or passphrase was supplied.
    #[error("missing key: manifest is encrypted but no key or passphrase was supplied")]
    MissingKey,

    /// A chunk's recomputed digest did not match its recorded digest.
    #[error("integrity error at chunk {chunk_index}: expected {expected}, got {actual}")]
    IntegrityError {
        /// Index of the offending chunk.
        chunk_index: u64,
        /// Digest recorded in the manifest.
        expected: String,
        /// Digest recomputed from the stored blob.
        actual: String,
    },

    /// AEAD decryption failed (wrong key, tampered ciphertext/nonce/tag).
    #[error("decryption integrity check failed")]
    DecryptionIntegrityError,

    /// The byte source failed mid-`store`.
    #[error("stream error after {chunks_written} chunk(s): {source}")]
    StreamError {
        /// Number of chunks successfully written before the failure.
        chunks_written: u64,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A persisted tree-entry line did not match `"<mode> <type> <oid>\t<name>"`.
    #[error("tree parse error: {line:?}")]
    TreeParseError {
        /// The offending raw line.
        line: String,
    },

    /// A tree lacked a `manifest.<ext>` entry.
    #[error("manifest not found in tree {tree_oid}: expected entry {expected_name}")]
    ManifestNotFound {
        /// OID of the tree that was read.
        tree_oid: String,
        /// Name the engine looked for (`manifest.<codec extension>`).
        expected_name: String,
    },

    /// A sub-manifest's bookkeeping (`start_index`/`chunk_count`) did not
    /// match what its parent `SubManifestRef` claimed.
    #[error("merkle bookkeeping mismatch in sub-manifest {oid}: {detail}")]
    MerkleMismatch {
        /// OID of the sub-manifest blob.
        oid: String,
        /// Human-readable description of the mismatch.
        detail: String,
    },

    /// A manifest or value record failed constructor-time validation.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// Codec encode/decode failure, interpreted as manifest corruption.
    #[error("codec error: {0}")]
    CodecError(String),

    /// The underlying object database command failed.
    #[error("git error: {0}")]
    GitError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CasError {
    /// The short machine code used in the `error` event and in logs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidKeyType => "INVALID_KEY_TYPE",
            Self::InvalidKeyLength { .. } => "INVALID_KEY_LENGTH",
            Self::MissingKey => "MISSING_KEY",
            Self::IntegrityError { .. } | Self::DecryptionIntegrityError => "INTEGRITY_ERROR",
            Self::StreamError { .. } => "STREAM_ERROR",
            Self::TreeParseError { .. } => "TREE_PARSE_ERROR",
            Self::ManifestNotFound { .. } => "MANIFEST_NOT_FOUND",
            Self::MerkleMismatch { .. } => "MERKLE_MISMATCH",
            Self::InvalidManifest(_) => "INVALID_MANIFEST",
            Self::CodecError(_) => "CODEC_ERROR",
            Self::GitError(_) => "GIT_ERROR",
        }
    }

    /// Wrap an opaque persistence-port failure as [`CasError::GitError`].
    pub fn git_error(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::GitError(Box::new(source))
    }
}
