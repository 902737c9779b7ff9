//! Checksum computation and validation.
//!
//! Objects carry two digests, both base64 encoded: MD5 and CRC32C (the
//! CRC32C as its four big-endian bytes). Client-declared digests must match
//! the computed ones exactly.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use digest::Digest;

use gcstack_storage_model::DeclaredChecksums;

use crate::error::{StorageError, StorageResult};

// ---------------------------------------------------------------------------
// Standalone checksum functions
// ---------------------------------------------------------------------------

/// Compute the base64 MD5 of `data`.
///
/// # Examples
///
/// ```
/// use gcstack_storage_core::checksums::compute_md5;
///
/// assert_eq!(compute_md5(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
/// ```
#[must_use]
pub fn compute_md5(data: &[u8]) -> String {
    BASE64_STANDARD.encode(md5::Md5::digest(data))
}

/// Compute the base64 big-endian CRC32C of `data`.
///
/// # Examples
///
/// ```
/// use gcstack_storage_core::checksums::compute_crc32c;
///
/// assert_eq!(compute_crc32c(b""), "AAAAAA==");
/// ```
#[must_use]
pub fn compute_crc32c(data: &[u8]) -> String {
    BASE64_STANDARD.encode(crc32c::crc32c(data).to_be_bytes())
}

/// Compute an entity tag for a resource version.
///
/// The tag is the hex MD5 of `key` and the version numbers, so it changes
/// whenever either number changes.
#[must_use]
pub fn compute_etag(key: &str, generation: i64, metageneration: i64) -> String {
    let mut hasher = md5::Md5::new();
    hasher.update(key.as_bytes());
    hasher.update(generation.to_be_bytes());
    hasher.update(metageneration.to_be_bytes());
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// ObjectChecksums
// ---------------------------------------------------------------------------

/// Digests computed over an object's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectChecksums {
    /// Base64 MD5.
    pub md5_hash: String,
    /// Base64 big-endian CRC32C.
    pub crc32c: String,
}

impl ObjectChecksums {
    /// Compute both digests over `data`.
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self {
            md5_hash: compute_md5(data),
            crc32c: compute_crc32c(data),
        }
    }

    /// Check every declared digest against the computed one.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ChecksumMismatch`] naming the first digest that
    /// differs.
    pub fn verify(&self, declared: &DeclaredChecksums) -> StorageResult<()> {
        if let Some(expected) = &declared.md5_hash {
            if expected != &self.md5_hash {
                return Err(StorageError::ChecksumMismatch {
                    algorithm: "md5",
                    expected: expected.clone(),
                    actual: self.md5_hash.clone(),
                });
            }
        }
        if let Some(expected) = &declared.crc32c {
            if expected != &self.crc32c {
                return Err(StorageError::ChecksumMismatch {
                    algorithm: "crc32c",
                    expected: expected.clone(),
                    actual: self.crc32c.clone(),
                });
            }
        }
        Ok(())
    }
}
