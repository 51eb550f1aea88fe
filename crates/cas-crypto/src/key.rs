//! Raw AES-256 key material.
//!
//! The donor workspace's security-sensitive crates zeroize key bytes on
//! drop; this type follows the same practice, since it costs nothing and
//! matches the ambient security bar of the rest of the codebase.

use cas_core::CasError;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Required key length in bytes for AES-256-GCM.
pub const KEY_LEN: usize = 32;

/// Exactly 32 bytes of raw symmetric key material, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    /// Validate and wrap raw key bytes. Fails with
    /// [`CasError::InvalidKeyLength`] unless `bytes.len() == 32`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CasError> {
        if bytes.len() != KEY_LEN {
            return Err(CasError::InvalidKeyLength { expected: KEY_LEN, actual: bytes.len() });
        }
        let mut buf = [0u8; KEY_LEN];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Borrow the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Key(<redacted>)")
    }
}
