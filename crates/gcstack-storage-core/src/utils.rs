//! Shared utilities for the storage engine.
//!
//! Provides ID generation, range-header parsing, ETag matching and the
//! opaque token encodings used for list pagination and rewrite
//! continuation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use digest::Digest;
use rand::RngExt as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

// ---------------------------------------------------------------------------
// ID generation
// ---------------------------------------------------------------------------

/// Derive a resumable upload id from its target and a store-wide sequence
/// number.
///
/// The same inputs always produce the same id; the sequence number keeps
/// two sessions for the same object distinct.
///
/// # Examples
///
/// ```
/// use gcstack_storage_core::utils::generate_upload_id;
///
/// let id = generate_upload_id("b1", "f", 1);
/// assert_eq!(id, generate_upload_id("b1", "f", 1));
/// assert_ne!(id, generate_upload_id("b1", "f", 2));
/// assert_eq!(id.len(), 32);
/// ```
#[must_use]
pub fn generate_upload_id(bucket: &str, name: &str, sequence: u64) -> String {
    let key = format!("{bucket}/o/{name}#{sequence}");
    hex::encode(md5::Md5::digest(key.as_bytes()))
}

/// Generate a random id for a rewrite operation.
///
/// # Examples
///
/// ```
/// use gcstack_storage_core::utils::generate_operation_id;
///
/// let id = generate_operation_id();
/// assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn generate_operation_id() -> String {
    let mut rng = rand::rng();
    let mut buf = [0u8; 8];
    rng.fill(&mut buf);
    format!("{}{}", Uuid::new_v4().simple(), hex::encode(buf))
}

// ---------------------------------------------------------------------------
// Range header parsing
// ---------------------------------------------------------------------------

/// Parse an HTTP `Range` header value and return the inclusive byte range.
///
/// Supported formats:
/// - `bytes=0-499` -- first 500 bytes
/// - `bytes=-500` -- last 500 bytes
/// - `bytes=500-` -- from byte 500 to the end
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] if the header is malformed or
/// the range is not satisfiable.
///
/// # Examples
///
/// ```
/// use gcstack_storage_core::utils::parse_range_header;
///
/// let (start, end) = parse_range_header("bytes=0-499", 1000).unwrap();
/// assert_eq!((start, end), (0, 499));
/// ```
pub fn parse_range_header(range: &str, content_length: u64) -> StorageResult<(u64, u64)> {
    let unsatisfiable = || StorageError::invalid(format!("Range not satisfiable: {range}"));
    let spec = range
        .trim()
        .strip_prefix("bytes=")
        .ok_or_else(unsatisfiable)?;

    if content_length == 0 {
        return Err(unsatisfiable());
    }

    if let Some(suffix) = spec.strip_prefix('-') {
        let n: u64 = suffix.parse().map_err(|_| unsatisfiable())?;
        if n == 0 {
            return Err(unsatisfiable());
        }
        Ok((content_length.saturating_sub(n), content_length - 1))
    } else if let Some(prefix) = spec.strip_suffix('-') {
        let start: u64 = prefix.parse().map_err(|_| unsatisfiable())?;
        if start >= content_length {
            return Err(unsatisfiable());
        }
        Ok((start, content_length - 1))
    } else {
        let (start, end) = spec.split_once('-').ok_or_else(unsatisfiable)?;
        let start: u64 = start.parse().map_err(|_| unsatisfiable())?;
        let end: u64 = end.parse().map_err(|_| unsatisfiable())?;
        if start > end || start >= content_length {
            return Err(unsatisfiable());
        }
        Ok((start, end.min(content_length - 1)))
    }
}

// ---------------------------------------------------------------------------
// Conditional request helpers
// ---------------------------------------------------------------------------

/// Check whether `etag` satisfies an `If-Match` value (`*` matches any).
///
/// # Examples
///
/// ```
/// use gcstack_storage_core::utils::is_valid_if_match;
///
/// assert!(is_valid_if_match("abc", "*"));
/// assert!(is_valid_if_match("abc", "\"abc\""));
/// assert!(!is_valid_if_match("abc", "xyz"));
/// ```
#[must_use]
pub fn is_valid_if_match(etag: &str, if_match: &str) -> bool {
    if if_match == "*" {
        return true;
    }
    normalize_etag(etag) == normalize_etag(if_match)
}

/// Check whether `etag` satisfies an `If-None-Match` value.
///
/// Returns `false` when the tags match or the value is `*`.
#[must_use]
pub fn is_valid_if_none_match(etag: &str, if_none_match: &str) -> bool {
    if if_none_match == "*" {
        return false;
    }
    normalize_etag(etag) != normalize_etag(if_none_match)
}

/// Strip surrounding double quotes and a weak `W/` prefix.
fn normalize_etag(etag: &str) -> &str {
    let etag = etag.trim();
    let etag = etag.strip_prefix("W/").unwrap_or(etag);
    etag.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(etag)
}

// ---------------------------------------------------------------------------
// Opaque tokens
// ---------------------------------------------------------------------------

/// Encode a value as an opaque URL-safe token.
///
/// # Errors
///
/// Returns [`StorageError::Internal`] if the value cannot be serialized.
pub fn encode_token<T: Serialize>(value: &T) -> StorageResult<String> {
    let json = serde_json::to_vec(value).map_err(anyhow::Error::from)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a token produced by [`encode_token`].
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] if the token is not one this
/// store minted.
///
/// # Examples
///
/// ```
/// use gcstack_storage_core::utils::{decode_token, encode_token};
///
/// let token = encode_token(&("photos/2024/img.jpg", 7_i64)).unwrap();
/// let (name, generation): (String, i64) = decode_token(&token).unwrap();
/// assert_eq!(name, "photos/2024/img.jpg");
/// assert_eq!(generation, 7);
/// ```
pub fn decode_token<T: DeserializeOwned>(token: &str) -> StorageResult<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| StorageError::invalid("Invalid page or continuation token"))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| StorageError::invalid("Invalid page or continuation token"))
}

/// Build the resumable-upload location for a session.
#[must_use]
pub fn resumable_location(base: &str, bucket: &str, upload_id: &str) -> String {
    format!("{base}/upload/storage/v1/b/{bucket}/o?uploadType=resumable&upload_id={upload_id}")
}
