//! Passphrase-to-key derivation (PBKDF2-HMAC-SHA256 and scrypt).

use cas_core::model::{KdfAlgorithm, KdfParams};
use cas_core::CasError;

use crate::key::Key;

/// Inputs to [`derive`]. `salt` is random when omitted.
pub struct DeriveKeyRequest {
    /// User-supplied passphrase bytes.
    pub passphrase: Vec<u8>,
    /// 32-byte salt; generated randomly when `None`.
    pub salt: Option<[u8; 32]>,
    /// Algorithm and tuning parameters to use.
    pub algorithm: KdfAlgorithm,
    /// Length in bytes of the derived key (typically 32).
    pub key_length: usize,
}

/// Result of a key derivation: the derived key plus the parameters used,
/// so the same key can be re-derived later from the passphrase alone.
pub struct DerivedKey {
    /// The derived key.
    pub key: Key,
    /// Echoes the actual algorithm, salt and key length used.
    pub params: KdfParams,
}

/// Derive a key from a passphrase using the requested algorithm.
pub fn derive(req: DeriveKeyRequest, random_bytes: impl FnOnce(usize) -> Vec<u8>) -> Result<DerivedKey, CasError> {
    let salt = match req.salt {
        Some(s) => s,
        None => {
            let bytes = random_bytes(32);
            let mut buf = [0u8; 32];
            buf.copy_from_slice(&bytes);
            buf
        }
    };

    let mut out = vec![0u8; req.key_length];
    match &req.algorithm {
        KdfAlgorithm::Pbkdf2 { iterations } => {
            pbkdf2::pbkdf2_hmac::<sha2::Sha256>(&req.passphrase, &salt, *iterations, &mut out);
        }
        KdfAlgorithm::Scrypt { cost, block_size, parallelization } => {
            if !cost.is_power_of_two() {
                return Err(CasError::InvalidManifest(format!("scrypt cost must be a power of two, got {cost}")));
            }
            let log_n = cost.trailing_zeros() as u8;
            let params = scrypt::Params::new(log_n, *block_size, *parallelization, req.key_length)
                .map_err(|e| CasError::InvalidManifest(format!("invalid scrypt params: {e}")))?;
            scrypt::scrypt(&req.passphrase, &salt, &params, &mut out)
                .map_err(|e| CasError::InvalidManifest(format!("scrypt derivation failed: {e}")))?;
        }
    }

    let key = Key::from_bytes(&out)?;
    let salt_b64 = {
        use base64::Engine as _;
        base64::engine::general_purpose::STANDARD.encode(salt)
    };
    let params = KdfParams::new(req.algorithm, salt_b64, req.key_length)?;
    Ok(DerivedKey { key, params })
}
