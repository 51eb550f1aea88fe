//! Crypto port and default backend: SHA-256, random bytes, AES-256-GCM
//! (one-shot and streaming) and passphrase key derivation.
//!
//! Nonces are freshly random per encryption rather than derived from
//! `(key, digest)`: manifests carry the nonce explicitly, and nonce reuse
//! must never happen. Compression lives in `cas-engine`, ahead of the
//! crypto stage in the pipeline, not in this crate.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod kdf;
mod key;

pub use kdf::{derive, DeriveKeyRequest, DerivedKey};
pub use key::{Key, KEY_LEN};

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use cas_core::{CasError, EncryptionMeta};
use rand::RngCore;
use sha2::{Digest as ShaDigestTrait, Sha256};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// SHA-256, random bytes, AEAD and KDF operations the engine needs without
/// depending on a specific backend.
pub trait CryptoPort: Send + Sync {
    /// Lowercase hex SHA-256 digest of `bytes`.
    fn sha256(&self, bytes: &[u8]) -> String;

    /// `n` cryptographically random bytes.
    fn random_bytes(&self, n: usize) -> Vec<u8>;

    /// One-shot AES-256-GCM encryption with a fresh random nonce.
    fn encrypt_buffer(&self, plaintext: &[u8], key: &Key) -> Result<(Vec<u8>, EncryptionMeta), CasError>;

    /// One-shot AES-256-GCM decryption. Fails with
    /// [`CasError::DecryptionIntegrityError`] if the tag does not verify.
    fn decrypt_buffer(&self, ciphertext: &[u8], key: &Key, meta: &EncryptionMeta) -> Result<Vec<u8>, CasError>;

    /// Begin a streaming encryption session over `key`.
    fn create_encryption_stream(&self, key: Key) -> Box<dyn EncryptionStream>;

    /// Derive a 32-byte key from a passphrase.
    fn derive_key(&self, req: DeriveKeyRequest) -> Result<DerivedKey, CasError>;
}

/// A streaming encryption session created by [`CryptoPort::create_encryption_stream`].
///
/// `aes-gcm`'s one-shot AEAD has no incremental API that produces a single
/// nonce/tag pair for an arbitrarily long input, so this backend buffers
/// plaintext fed via [`EncryptionStream::encrypt_chunk`] and performs the
/// real encryption once, inside [`EncryptionStream::finalize`]: a single
/// trailing emission plus the tag on finalize, the expected shape for any
/// one-shot AEAD runtime asked to act as a streaming encryptor.
pub trait EncryptionStream: Send {
    /// Feed a plaintext fragment into the stream.
    fn encrypt_chunk(&mut self, plaintext: &[u8]);

    /// Consume the stream: encrypt everything fed so far in one AEAD call
    /// and return the ciphertext plus the resulting metadata. Must be
    /// called only after the input is fully consumed, and exactly once.
    fn finalize(self: Box<Self>) -> Result<(Vec<u8>, EncryptionMeta), CasError>;
}

/// Default crypto backend: `sha2` + `aes-gcm` + `pbkdf2`/`scrypt`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCrypto;

impl DefaultCrypto {
    fn cipher_for(key: &Key) -> Aes256Gcm {
        Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(key.as_bytes()))
    }
}

impl CryptoPort for DefaultCrypto {
    fn sha256(&self, bytes: &[u8]) -> String {
        let digest = Sha256::digest(bytes);
        hex::encode(digest)
    }

    fn random_bytes(&self, n: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        rand::thread_rng().fill_bytes(&mut buf);
        buf
    }

    fn encrypt_buffer(&self, plaintext: &[u8], key: &Key) -> Result<(Vec<u8>, EncryptionMeta), CasError> {
        let cipher = Self::cipher_for(key);
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let mut sealed = cipher.encrypt(nonce, plaintext).map_err(|_| CasError::DecryptionIntegrityError)?;
        let tag = sealed.split_off(sealed.len() - TAG_LEN);
        let meta = EncryptionMeta::new(b64(&nonce_bytes), b64(&tag), None)?;
        Ok((sealed, meta))
    }

    fn decrypt_buffer(&self, ciphertext: &[u8], key: &Key, meta: &EncryptionMeta) -> Result<Vec<u8>, CasError> {
        let nonce_bytes = unb64(meta.nonce())?;
        let tag_bytes = unb64(meta.tag())?;
        let cipher = Self::cipher_for(key);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let mut sealed = Vec::with_capacity(ciphertext.len() + tag_bytes.len());
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(&tag_bytes);
        cipher.decrypt(nonce, sealed.as_slice()).map_err(|_| CasError::DecryptionIntegrityError)
    }

    fn create_encryption_stream(&self, key: Key) -> Box<dyn EncryptionStream> {
        Box::new(BufferedEncryptionStream { key, buffer: Vec::new() })
    }

    fn derive_key(&self, req: DeriveKeyRequest) -> Result<DerivedKey, CasError> {
        kdf::derive(req, |n| self.random_bytes(n))
    }
}

struct BufferedEncryptionStream {
    key: Key,
    buffer: Vec<u8>,
}

impl EncryptionStream for BufferedEncryptionStream {
    fn encrypt_chunk(&mut self, plaintext: &[u8]) {
        self.buffer.extend_from_slice(plaintext);
    }

    fn finalize(self: Box<Self>) -> Result<(Vec<u8>, EncryptionMeta), CasError> {
        DefaultCrypto.encrypt_buffer(&self.buffer, &self.key)
    }
}

fn b64(bytes: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn unb64(s: &str) -> Result<Vec<u8>, CasError> {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|e| CasError::InvalidManifest(format!("invalid base64: {e}")))
}
