//! Gzip compression/decompression, applied as the first transform on store
//! and the last on restore.

use std::io::Write;

use cas_core::CasError;
use flate2::write::{GzDecoder, GzEncoder};
use flate2::Compression;

/// Compress `plain` with gzip at the default compression level.
pub fn gzip_compress(plain: &[u8]) -> Result<Vec<u8>, CasError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(plain)
        .map_err(|e| CasError::StreamError { chunks_written: 0, source: e })?;
    encoder.finish().map_err(|e| CasError::StreamError { chunks_written: 0, source: e })
}

/// Decompress a gzip-framed buffer back to its original plaintext.
pub fn gzip_decompress(compressed: &[u8]) -> Result<Vec<u8>, CasError> {
    let mut decoder = GzDecoder::new(Vec::new());
    decoder
        .write_all(compressed)
        .map_err(|_| CasError::DecryptionIntegrityError)?;
    decoder.finish().map_err(|_| CasError::DecryptionIntegrityError)
}
