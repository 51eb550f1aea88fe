//! Manifest codec port and its two concrete implementations.
//!
//! A [`Codec`] turns a [`Manifest`] into bytes and back. The engine never
//! assumes a particular wire format; it only relies on the round-trip law
//! `decode(encode(m)) == m` and on `extension()` to name the manifest entry
//! inside a tree (`manifest.<extension>`).

#![deny(unsafe_code)]
#![warn(missing_docs)]

use cas_core::{CasError, Manifest};

/// Encode/decode port for manifest records.
pub trait Codec: Send + Sync {
    /// Serialize a manifest to bytes.
    fn encode(&self, manifest: &Manifest) -> Result<Vec<u8>, CasError>;

    /// Deserialize a manifest from bytes. Decode failures are interpreted by
    /// the engine as manifest corruption (propagated unwrapped as
    /// [`CasError::CodecError`]).
    fn decode(&self, bytes: &[u8]) -> Result<Manifest, CasError>;

    /// File-extension-like suffix used to name the manifest entry inside a
    /// tree: `manifest.<extension>`.
    fn extension(&self) -> &'static str;
}

/// Textual, human-readable codec backed by `serde_json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, manifest: &Manifest) -> Result<Vec<u8>, CasError> {
        serde_json::to_vec_pretty(manifest).map_err(|e| CasError::CodecError(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Manifest, CasError> {
        serde_json::from_slice(bytes).map_err(|e| CasError::CodecError(e.to_string()))
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

/// Compact binary codec backed by `serde_cbor`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CborCodec;

impl Codec for CborCodec {
    fn encode(&self, manifest: &Manifest) -> Result<Vec<u8>, CasError> {
        serde_cbor::to_vec(manifest).map_err(|e| CasError::CodecError(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Manifest, CasError> {
        serde_cbor::from_slice(bytes).map_err(|e| CasError::CodecError(e.to_string()))
    }

    fn extension(&self) -> &'static str {
        "cbor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_core::model::{
        Chunk, CompressionMeta, EncryptionMeta, KdfAlgorithm, KdfParams, ManifestFields, SubManifestRef,
    };

    fn sample_chunk(index: u64, seed: u8) -> Chunk {
        let digest = format!("{:02x}", seed).repeat(32);
        Chunk::new(index, 16, digest, format!("blob-{index}")).unwrap()
    }

    fn flat_manifest() -> Manifest {
        Manifest::new(ManifestFields {
            slug: "asset-1".into(),
            filename: "asset.bin".into(),
            size: 32,
            chunks: vec![sample_chunk(0, 0xaa), sample_chunk(1, 0xbb)],
            ..Default::default()
        })
        .unwrap()
    }

    fn encrypted_manifest() -> Manifest {
        use base64::Engine as _;
        let nonce = base64::engine::general_purpose::STANDARD.encode([7u8; 12]);
        let tag = base64::engine::general_purpose::STANDARD.encode([9u8; 16]);
        let salt = base64::engine::general_purpose::STANDARD.encode([1u8; 32]);
        let kdf = KdfParams::new(KdfAlgorithm::Scrypt { cost: 16384, block_size: 8, parallelization: 1 }, salt, 32)
            .unwrap();
        let enc = EncryptionMeta::new(nonce, tag, Some(kdf)).unwrap();
        Manifest::new(ManifestFields {
            slug: "secret".into(),
            filename: "secret.bin".into(),
            size: 16,
            chunks: vec![sample_chunk(0, 0xcc)],
            encryption: Some(enc),
            compression: Some(CompressionMeta::gzip()),
            ..Default::default()
        })
        .unwrap()
    }

    fn merkle_root() -> Manifest {
        let subs = vec![
            SubManifestRef::new("sub-0", 5, 0).unwrap(),
            SubManifestRef::new("sub-1", 5, 5).unwrap(),
            SubManifestRef::new("sub-2", 2, 10).unwrap(),
        ];
        Manifest::new(ManifestFields {
            version: Some(2),
            slug: "big-asset".into(),
            filename: "big.bin".into(),
            size: 12 * 262_144,
            sub_manifests: Some(subs),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn json_round_trips_every_shape() {
        let codec = JsonCodec;
        for m in [flat_manifest(), encrypted_manifest(), merkle_root()] {
            let bytes = codec.encode(&m).unwrap();
            let back = codec.decode(&bytes).unwrap();
            assert_eq!(back, m);
        }
    }

    #[test]
    fn cbor_round_trips_every_shape() {
        let codec = CborCodec;
        for m in [flat_manifest(), encrypted_manifest(), merkle_root()] {
            let bytes = codec.encode(&m).unwrap();
            let back = codec.decode(&bytes).unwrap();
            assert_eq!(back, m);
        }
    }

    #[test]
    fn extensions_are_distinct() {
        assert_eq!(JsonCodec.extension(), "json");
        assert_eq!(CborCodec.extension(), "cbor");
    }

    #[test]
    fn decode_garbage_is_codec_error_not_panic() {
        let err = JsonCodec.decode(b"not json").unwrap_err();
        assert_eq!(err.code(), "CODEC_ERROR");
        let err = CborCodec.decode(&[0xff, 0x00, 0x01]).unwrap_err();
        assert_eq!(err.code(), "CODEC_ERROR");
    }
}
