//! Shared key-resolution logic for `store` and `restore`: validating raw
//! keys, deriving from a passphrase, and enforcing "exactly one of key or
//! passphrase".

use cas_core::model::{KdfAlgorithm, KdfParams};
use cas_core::CasError;
use cas_crypto::{CryptoPort, DeriveKeyRequest, Key};

/// Default PBKDF2 iteration count used when a passphrase is supplied to
/// `store` without an explicit `kdf_algorithm`.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;

/// Either a raw key or a passphrase, never both — the shape `store` and
/// `restore` inputs share.
#[derive(Default)]
pub struct KeyMaterial {
    /// Raw 32-byte key.
    pub key: Option<Vec<u8>>,
    /// Passphrase to derive a key from.
    pub passphrase: Option<Vec<u8>>,
}

impl KeyMaterial {
    fn validate_exclusive(&self) -> Result<(), CasError> {
        if self.key.is_some() && self.passphrase.is_some() {
            return Err(CasError::InvalidManifest(
                "exactly one of encryption_key or passphrase may be supplied".into(),
            ));
        }
        Ok(())
    }
}

/// Resolve key material for `store`: validate a raw key, or derive one from
/// a passphrase (recording the `KdfParams` used so `restore` can re-derive
/// it later).
pub fn resolve_for_store(
    crypto: &dyn CryptoPort,
    material: &KeyMaterial,
    kdf_algorithm: Option<KdfAlgorithm>,
) -> Result<Option<(Key, Option<KdfParams>)>, CasError> {
    material.validate_exclusive()?;
    match (&material.key, &material.passphrase) {
        (Some(bytes), None) => Ok(Some((Key::from_bytes(bytes)?, None))),
        (None, Some(passphrase)) => {
            let algorithm = kdf_algorithm.unwrap_or(KdfAlgorithm::Pbkdf2 { iterations: DEFAULT_PBKDF2_ITERATIONS });
            let derived = crypto.derive_key(DeriveKeyRequest {
                passphrase: passphrase.clone(),
                salt: None,
                algorithm,
                key_length: 32,
            })?;
            Ok(Some((derived.key, Some(derived.params))))
        }
        (None, None) => Ok(None),
        (Some(_), Some(_)) => unreachable!("validate_exclusive rejected this above"),
    }
}

/// Resolve key material for `restore`. Unlike `store`, a passphrase can only
/// be used if the manifest recorded `KdfParams` from the original store —
/// restoring from a passphrase against a manifest whose encryption block
/// lacks `kdf` (implying the original store used a raw key) is rejected
/// with [`CasError::MissingKey`].
pub fn resolve_for_restore(
    crypto: &dyn CryptoPort,
    material: &KeyMaterial,
    manifest_kdf: Option<&KdfParams>,
) -> Result<Option<Key>, CasError> {
    material.validate_exclusive()?;
    match (&material.key, &material.passphrase) {
        (Some(bytes), None) => Ok(Some(Key::from_bytes(bytes)?)),
        (None, Some(passphrase)) => {
            let kdf_params = manifest_kdf.ok_or(CasError::MissingKey)?;
            let salt = decode_salt(&kdf_params.salt)?;
            let derived = crypto.derive_key(DeriveKeyRequest {
                passphrase: passphrase.clone(),
                salt: Some(salt),
                algorithm: kdf_params.algorithm.clone(),
                key_length: kdf_params.key_length,
            })?;
            Ok(Some(derived.key))
        }
        (None, None) => Ok(None),
        (Some(_), Some(_)) => unreachable!("validate_exclusive rejected this above"),
    }
}

fn decode_salt(salt_b64: &str) -> Result<[u8; 32], CasError> {
    use base64::Engine as _;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(salt_b64)
        .map_err(|e| CasError::InvalidManifest(format!("invalid kdf salt base64: {e}")))?;
    if bytes.len() != 32 {
        return Err(CasError::InvalidManifest(format!("kdf salt must be 32 bytes, got {}", bytes.len())));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}
