//! Operation outputs.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::{Bucket, Object};

/// Result of `list_buckets`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBucketsOutput {
    /// Buckets sorted by name.
    pub items: Vec<Bucket>,
}

/// One entry produced by a lazy object listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEntry {
    /// An object generation.
    Object(Box<Object>),
    /// A common prefix, delimiter included.
    Prefix(String),
}

/// One page of `list_objects`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListObjectsOutput {
    /// Objects on this page.
    pub items: Vec<Object>,
    /// Common prefixes on this page, in name order.
    pub prefixes: Vec<String>,
    /// Token for the next page, absent on the last one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Result of `read_object_media`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadObjectOutput {
    /// The resolved generation's metadata.
    pub object: Object,
    /// The requested bytes.
    pub data: Bytes,
    /// Inclusive byte range served, when a range was requested.
    pub range: Option<(u64, u64)>,
}

/// Result of `rewrite_object` and `copy_object`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteObjectOutput {
    /// Whether the destination has been written.
    pub done: bool,
    /// Bytes copied so far, across all calls.
    pub total_bytes_rewritten: u64,
    /// Size of the pinned source generation.
    pub object_size: u64,
    /// Continuation token, present while not done.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite_token: Option<String>,
    /// The destination object, present once done.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Object>,
}

/// A newly started resumable upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumableUploadSession {
    /// Session id.
    pub upload_id: String,
    /// Resumable location the client sends chunks to.
    pub location: String,
}

/// Progress of a resumable upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// More bytes are expected.
    Incomplete {
        /// Bytes accepted so far (last persisted offset + 1).
        persisted_size: u64,
    },
    /// The upload has been finalized into this object.
    Complete(Box<Object>),
}

impl UploadStatus {
    /// Whether the upload has been finalized.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// The finalized object, if complete.
    #[must_use]
    pub fn object(&self) -> Option<&Object> {
        match self {
            Self::Complete(object) => Some(object),
            Self::Incomplete { .. } => None,
        }
    }

    /// `Range` header value reporting progress (`bytes=0-N`), absent when
    /// nothing has been persisted or the upload is complete.
    #[must_use]
    pub fn range_header(&self) -> Option<String> {
        match self {
            Self::Incomplete { persisted_size } if *persisted_size > 0 => {
                Some(format!("bytes=0-{}", persisted_size - 1))
            }
            _ => None,
        }
    }
}

/// Counts of abandoned state dropped by `purge_expired`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    /// Upload sessions removed.
    pub uploads: usize,
    /// Rewrite operations removed.
    pub rewrites: usize,
}
