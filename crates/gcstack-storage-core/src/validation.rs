//! Validation for bucket and object names.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{StorageError, StorageResult};

/// Maximum object name length in bytes.
const MAX_OBJECT_NAME_BYTES: usize = 1024;

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum length of an undotted bucket name, and of each dotted component.
const MAX_BUCKET_COMPONENT_LEN: usize = 63;

/// Maximum length of a dotted bucket name.
const MAX_DOTTED_BUCKET_NAME_LEN: usize = 222;

/// `google` and its look-alike spellings.
static RESERVED_BRAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("g[0o][0o]g[1l][e3]").unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

/// Validate a bucket name.
///
/// Rules:
/// - 3-63 characters, or up to 222 when the name contains dots, with every
///   dot-separated component at most 63 characters
/// - Only lowercase letters, digits, `-`, `_` and `.`
/// - Must start and end with a letter or digit
/// - Must not start with `goog`
/// - Must not contain `google` or a look-alike such as `g00gle` or `goog1e`
/// - Must not be a dotted-quad IPv4 address
///
/// # Errors
///
/// Returns [`StorageError::InvalidBucketName`] if any rule is violated.
///
/// # Examples
///
/// ```
/// use gcstack_storage_core::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("my_bucket-1").is_ok());
/// assert!(validate_bucket_name("goog-bucket").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> StorageResult<()> {
    let invalid = |reason: &str| StorageError::InvalidBucketName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };
    let len = name.len();
    let max_len = if name.contains('.') {
        MAX_DOTTED_BUCKET_NAME_LEN
    } else {
        MAX_BUCKET_COMPONENT_LEN
    };

    if !(MIN_BUCKET_NAME_LEN..=max_len).contains(&len) {
        return Err(invalid(&format!(
            "Bucket name must be between {MIN_BUCKET_NAME_LEN} and {max_len} characters long"
        )));
    }

    if name.split('.').any(|c| c.len() > MAX_BUCKET_COMPONENT_LEN) {
        return Err(invalid(&format!(
            "Each dot-separated component must be at most {MAX_BUCKET_COMPONENT_LEN} characters long"
        )));
    }

    if !name.bytes().all(|b| {
        b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_' || b == b'.'
    }) {
        return Err(invalid(
            "Bucket name must only contain lowercase letters, digits, '-', '_' and '.'",
        ));
    }

    let first = name.as_bytes()[0];
    let last = name.as_bytes()[len - 1];
    if !(first.is_ascii_lowercase() || first.is_ascii_digit())
        || !(last.is_ascii_lowercase() || last.is_ascii_digit())
    {
        return Err(invalid("Bucket name must start and end with a letter or digit"));
    }

    if name.starts_with("goog") {
        return Err(invalid("Bucket name must not start with 'goog'"));
    }

    if RESERVED_BRAND.is_match(name) {
        return Err(invalid("Bucket name must not contain 'google' or close misspellings"));
    }

    if name.parse::<Ipv4Addr>().is_ok() {
        return Err(invalid("Bucket name must not be an IP address"));
    }

    Ok(())
}

/// Validate an object name.
///
/// Rules:
/// - 1-1024 bytes of UTF-8
/// - No carriage return or line feed
/// - Not `.` or `..`
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] if any rule is violated.
///
/// # Examples
///
/// ```
/// use gcstack_storage_core::validation::validate_object_name;
///
/// assert!(validate_object_name("photos/2024/image.jpg").is_ok());
/// assert!(validate_object_name("").is_err());
/// ```
pub fn validate_object_name(name: &str) -> StorageResult<()> {
    if name.is_empty() {
        return Err(StorageError::invalid("Object name must not be empty"));
    }
    if name.len() > MAX_OBJECT_NAME_BYTES {
        return Err(StorageError::invalid(format!(
            "Object name must be at most {MAX_OBJECT_NAME_BYTES} bytes"
        )));
    }
    if name.contains(['\r', '\n']) {
        return Err(StorageError::invalid(
            "Object name must not contain carriage return or line feed",
        ));
    }
    if name == "." || name == ".." {
        return Err(StorageError::invalid("Object name must not be '.' or '..'"));
    }
    Ok(())
}
