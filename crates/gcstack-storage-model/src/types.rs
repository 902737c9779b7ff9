//! Resource and shared value types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RequestError;

// ---------------------------------------------------------------------------
// Access control
// ---------------------------------------------------------------------------

/// A single access-control entry. Roles are stored verbatim; policy
/// evaluation is the adaptor's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclEntry {
    /// Grantee, e.g. `allUsers` or `user-alice@example.com`.
    pub entity: String,
    /// Granted role, e.g. `READER` or `OWNER`.
    pub role: String,
}

impl AclEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(entity: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            role: role.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// A bucket resource as returned by bucket operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Globally unique bucket name.
    pub name: String,
    /// Resource id (same as the name).
    pub id: String,
    /// Owning project number.
    pub project_number: String,
    /// Incremented on every metadata update, starting at 1.
    pub metageneration: i64,
    /// Location constraint, e.g. `US`.
    pub location: String,
    /// Default storage class for new objects.
    pub storage_class: String,
    /// Whether non-live generations are retained.
    pub versioning_enabled: bool,
    /// User labels.
    pub labels: BTreeMap<String, String>,
    /// Bucket ACL.
    pub acl: Vec<AclEntry>,
    /// ACL applied to new objects that do not carry their own.
    pub default_object_acl: Vec<AclEntry>,
    /// Creation time.
    pub time_created: DateTime<Utc>,
    /// Last metadata update time.
    pub updated: DateTime<Utc>,
    /// Entity tag, changes with every metageneration.
    pub etag: String,
}

/// Attributes supplied when creating or fully updating a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BucketAttributes {
    /// Location constraint; the configured default when absent.
    pub location: Option<String>,
    /// Default storage class; `STANDARD` when absent.
    pub storage_class: Option<String>,
    /// Retain non-live generations.
    pub versioning_enabled: bool,
    /// User labels.
    pub labels: BTreeMap<String, String>,
    /// Bucket ACL.
    pub acl: Vec<AclEntry>,
    /// Default object ACL.
    pub default_object_acl: Vec<AclEntry>,
}

/// Partial bucket update. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BucketPatch {
    /// New storage class.
    pub storage_class: Option<String>,
    /// New versioning flag.
    pub versioning_enabled: Option<bool>,
    /// Label changes; a `None` value removes the label.
    pub labels: Option<BTreeMap<String, Option<String>>>,
    /// Replacement ACL.
    pub acl: Option<Vec<AclEntry>>,
    /// Replacement default object ACL.
    pub default_object_acl: Option<Vec<AclEntry>>,
}

impl BucketPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Metageneration preconditions for bucket operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BucketPreconditions {
    /// Proceed only if the bucket metageneration equals this value.
    pub if_metageneration_match: Option<i64>,
    /// Proceed only if the bucket metageneration differs from this value.
    pub if_metageneration_not_match: Option<i64>,
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// An object resource: the metadata of one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    /// Containing bucket.
    pub bucket: String,
    /// Object name.
    pub name: String,
    /// Content version; immutable once assigned.
    pub generation: i64,
    /// Metadata version of this generation, starting at 1.
    pub metageneration: i64,
    /// Content length in bytes.
    pub size: u64,
    /// Base64 MD5 of the content. Absent for composite objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5_hash: Option<String>,
    /// Base64 big-endian CRC32C of the content.
    pub crc32c: String,
    /// Entity tag, changes with every metageneration.
    pub etag: String,
    /// `Content-Type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// `Content-Encoding`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
    /// `Content-Disposition`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_disposition: Option<String>,
    /// `Content-Language`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_language: Option<String>,
    /// `Cache-Control`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
    /// Storage class.
    pub storage_class: String,
    /// KMS key the content is notionally encrypted with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_name: Option<String>,
    /// Number of source components for composite objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_count: Option<u32>,
    /// Free-form user metadata.
    pub metadata: BTreeMap<String, String>,
    /// Object ACL.
    pub acl: Vec<AclEntry>,
    /// Creation time of this generation.
    pub time_created: DateTime<Utc>,
    /// Last metadata update time.
    pub updated: DateTime<Utc>,
}

/// Mutable object attributes: supplied on insert, upload start, rewrite and
/// full update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectAttributes {
    /// `Content-Type`.
    pub content_type: Option<String>,
    /// `Content-Encoding`.
    pub content_encoding: Option<String>,
    /// `Content-Disposition`.
    pub content_disposition: Option<String>,
    /// `Content-Language`.
    pub content_language: Option<String>,
    /// `Cache-Control`.
    pub cache_control: Option<String>,
    /// Storage class; the bucket default when absent.
    pub storage_class: Option<String>,
    /// KMS key name.
    pub kms_key_name: Option<String>,
    /// Free-form user metadata.
    pub metadata: BTreeMap<String, String>,
    /// Object ACL; the bucket default object ACL when empty.
    pub acl: Vec<AclEntry>,
}

impl ObjectAttributes {
    /// Capture the mutable attributes of an existing object.
    #[must_use]
    pub fn from_object(object: &Object) -> Self {
        Self {
            content_type: object.content_type.clone(),
            content_encoding: object.content_encoding.clone(),
            content_disposition: object.content_disposition.clone(),
            content_language: object.content_language.clone(),
            cache_control: object.cache_control.clone(),
            storage_class: Some(object.storage_class.clone()),
            kms_key_name: object.kms_key_name.clone(),
            metadata: object.metadata.clone(),
            acl: object.acl.clone(),
        }
    }
}

/// Partial object metadata update. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectPatch {
    /// New `Content-Type`.
    pub content_type: Option<String>,
    /// New `Content-Encoding`.
    pub content_encoding: Option<String>,
    /// New `Content-Disposition`.
    pub content_disposition: Option<String>,
    /// New `Content-Language`.
    pub content_language: Option<String>,
    /// New `Cache-Control`.
    pub cache_control: Option<String>,
    /// Metadata changes; a `None` value removes the key.
    pub metadata: Option<BTreeMap<String, Option<String>>>,
    /// Replacement ACL.
    pub acl: Option<Vec<AclEntry>>,
}

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

/// Generation, metageneration and ETag preconditions on the target object.
///
/// An absent object compares as generation `0` and metageneration `0`, so
/// `if_generation_match: Some(0)` means "only if no live object exists".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preconditions {
    /// `ifGenerationMatch`.
    pub if_generation_match: Option<i64>,
    /// `ifGenerationNotMatch`.
    pub if_generation_not_match: Option<i64>,
    /// `ifMetagenerationMatch`.
    pub if_metageneration_match: Option<i64>,
    /// `ifMetagenerationNotMatch`.
    pub if_metageneration_not_match: Option<i64>,
    /// `If-Match`; `*` matches any existing object.
    pub if_etag_match: Option<String>,
    /// `If-None-Match`; `*` matches any existing object.
    pub if_etag_not_match: Option<String>,
}

impl Preconditions {
    /// Only proceed if no live object exists.
    #[must_use]
    pub fn does_not_exist() -> Self {
        Self {
            if_generation_match: Some(0),
            ..Self::default()
        }
    }

    /// Only proceed if the live generation is `generation`.
    #[must_use]
    pub fn generation_match(generation: i64) -> Self {
        Self {
            if_generation_match: Some(generation),
            ..Self::default()
        }
    }

    /// Whether no condition is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Preconditions on the source object of a copy, rewrite or compose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourcePreconditions {
    /// `ifSourceGenerationMatch`.
    pub if_source_generation_match: Option<i64>,
    /// `ifSourceGenerationNotMatch`.
    pub if_source_generation_not_match: Option<i64>,
    /// `ifSourceMetagenerationMatch`.
    pub if_source_metageneration_match: Option<i64>,
    /// `ifSourceMetagenerationNotMatch`.
    pub if_source_metageneration_not_match: Option<i64>,
}

// ---------------------------------------------------------------------------
// Checksums
// ---------------------------------------------------------------------------

/// Checksums declared by the client, base64 encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeclaredChecksums {
    /// Base64 MD5.
    pub md5_hash: Option<String>,
    /// Base64 big-endian CRC32C.
    pub crc32c: Option<String>,
}

impl DeclaredChecksums {
    /// Parse an `x-goog-hash` header value such as
    /// `crc32c=n03x6A==,md5=XrY7u+Ae7tCTyyK7j1rNww==`.
    ///
    /// Unknown algorithms are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MalformedHash`] when an entry has no `=`.
    pub fn parse_goog_hash(value: &str) -> Result<Self, RequestError> {
        let mut declared = Self::default();
        for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (algorithm, digest) = entry
                .split_once('=')
                .ok_or_else(|| RequestError::MalformedHash(value.to_owned()))?;
            match algorithm.trim() {
                "md5" => declared.md5_hash = Some(digest.trim().to_owned()),
                "crc32c" => declared.crc32c = Some(digest.trim().to_owned()),
                _ => {}
            }
        }
        Ok(declared)
    }

    /// Build from raw digests as carried by RPC payloads.
    #[must_use]
    pub fn from_raw(md5: Option<&[u8]>, crc32c: Option<u32>) -> Self {
        Self {
            md5_hash: md5.map(|d| BASE64_STANDARD.encode(d)),
            crc32c: crc32c.map(|c| BASE64_STANDARD.encode(c.to_be_bytes())),
        }
    }

    /// Whether nothing was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.md5_hash.is_none() && self.crc32c.is_none()
    }
}

// ---------------------------------------------------------------------------
// Content-Range
// ---------------------------------------------------------------------------

/// A parsed resumable-upload `Content-Range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRange {
    /// `bytes */*` or `bytes */TOTAL`: no payload, report progress.
    Query {
        /// Declared total, when known.
        total: Option<u64>,
    },
    /// `bytes FIRST-LAST/TOTAL` or `bytes FIRST-LAST/*`.
    Chunk {
        /// Offset of the first byte (inclusive).
        first: u64,
        /// Offset of the last byte (inclusive).
        last: u64,
        /// Declared total, when known.
        total: Option<u64>,
    },
}

impl ContentRange {
    /// Declared total object size, if any.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        match self {
            Self::Query { total } | Self::Chunk { total, .. } => *total,
        }
    }
}

impl FromStr for ContentRange {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RequestError::MalformedContentRange(s.to_owned());
        let spec = s.trim().strip_prefix("bytes ").ok_or_else(malformed)?;
        let (range, total) = spec.trim().split_once('/').ok_or_else(malformed)?;
        let total = match total {
            "*" => None,
            n => Some(n.parse::<u64>().map_err(|_| malformed())?),
        };
        if range == "*" {
            return Ok(Self::Query { total });
        }
        let (first, last) = range.split_once('-').ok_or_else(malformed)?;
        let first = first.parse::<u64>().map_err(|_| malformed())?;
        let last = last.parse::<u64>().map_err(|_| malformed())?;
        if last < first {
            return Err(malformed());
        }
        Ok(Self::Chunk { first, last, total })
    }
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = |t: &Option<u64>| t.map_or_else(|| "*".to_owned(), |n| n.to_string());
        match self {
            Self::Query { total: t } => write!(f, "bytes */{}", total(t)),
            Self::Chunk {
                first,
                last,
                total: t,
            } => write!(f, "bytes {first}-{last}/{}", total(t)),
        }
    }
}
