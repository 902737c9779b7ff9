//! In-flight rewrite operations.
//!
//! A rewrite copies a pinned source generation into a destination over one
//! or more calls. Between calls the operation is parked in
//! [`RewriteOperations`] under its id; the client holds a token that names
//! the id and the progress it last saw.

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use gcstack_storage_model::{ObjectAttributes, Preconditions, SourcePreconditions};

use crate::error::StorageResult;
use crate::utils::{decode_token, encode_token};

/// Parameters that must not change between calls of one rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteFingerprint {
    /// Source bucket.
    pub source_bucket: String,
    /// Source object name.
    pub source_object: String,
    /// Source generation as requested (`None` meaning live).
    pub source_generation: Option<i64>,
    /// Destination bucket.
    pub destination_bucket: String,
    /// Destination object name.
    pub destination_object: String,
    /// Destination preconditions.
    pub preconditions: Preconditions,
    /// Source preconditions.
    pub source_preconditions: SourcePreconditions,
    /// Destination predefined ACL.
    pub predefined_acl: Option<String>,
    /// Destination KMS key.
    pub kms_key_name: Option<String>,
    /// Requested per-call byte budget.
    pub max_bytes_rewritten_per_call: Option<i64>,
}

/// The decoded form of a rewrite token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteToken {
    /// Operation id.
    pub id: String,
    /// Bytes rewritten when the token was minted.
    pub bytes: u64,
}

impl RewriteToken {
    /// Encode as an opaque string.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StorageError::Internal`] if serialization fails.
    pub fn encode(&self) -> StorageResult<String> {
        encode_token(self)
    }

    /// Decode an opaque token string.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StorageError::InvalidArgument`] for a token
    /// this store did not mint.
    pub fn decode(token: &str) -> StorageResult<Self> {
        decode_token(token)
    }
}

/// One in-flight rewrite.
#[derive(Clone)]
pub struct RewriteOperation {
    /// Operation id.
    pub id: String,
    /// Source bucket.
    pub source_bucket: String,
    /// Source object name.
    pub source_object: String,
    /// Source generation pinned by the first call.
    pub source_generation: i64,
    /// Destination bucket.
    pub destination_bucket: String,
    /// Destination object name.
    pub destination_object: String,
    /// Fixed parameters captured by the first call.
    pub fingerprint: RewriteFingerprint,
    /// Bytes copied per call.
    pub budget: u64,
    /// Destination metadata: the request's, else the source's.
    pub attributes: ObjectAttributes,
    /// Full source content.
    pub source: Bytes,
    /// Bytes copied so far.
    pub buffer: BytesMut,
    /// First call time.
    pub created: DateTime<Utc>,
}

impl std::fmt::Debug for RewriteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteOperation")
            .field("id", &self.id)
            .field("source", &format_args!("{}/{}#{}", self.source_bucket, self.source_object, self.source_generation))
            .field("destination", &format_args!("{}/{}", self.destination_bucket, self.destination_object))
            .field("bytes_rewritten", &self.bytes_rewritten())
            .field("object_size", &self.object_size())
            .finish_non_exhaustive()
    }
}

impl RewriteOperation {
    /// Bytes copied so far.
    #[must_use]
    pub fn bytes_rewritten(&self) -> u64 {
        self.buffer.len() as u64
    }

    /// Size of the pinned source generation.
    #[must_use]
    pub fn object_size(&self) -> u64 {
        self.source.len() as u64
    }

    /// Whether every source byte has been copied.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.bytes_rewritten() == self.object_size()
    }

    /// Copy up to one budget of bytes. Returns how many were copied.
    pub fn advance(&mut self) -> u64 {
        let start = self.buffer.len();
        let remaining = self.source.len() - start;
        let step = usize::try_from(self.budget).map_or(remaining, |b| b.min(remaining));
        self.buffer
            .extend_from_slice(&self.source[start..start + step]);
        step as u64
    }

    /// The token naming this operation at its current progress.
    #[must_use]
    pub fn token(&self) -> RewriteToken {
        RewriteToken {
            id: self.id.clone(),
            bytes: self.bytes_rewritten(),
        }
    }
}

/// Parked rewrite operations, keyed by id.
#[derive(Default)]
pub struct RewriteOperations {
    operations: DashMap<String, RewriteOperation>,
}

impl std::fmt::Debug for RewriteOperations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteOperations")
            .field("operation_count", &self.operations.len())
            .finish()
    }
}

impl RewriteOperations {
    /// Park an operation until its next call.
    pub fn store(&self, operation: RewriteOperation) {
        self.operations.insert(operation.id.clone(), operation);
    }

    /// Remove and return an operation. Of two racing callers, only one
    /// receives it.
    #[must_use]
    pub fn take(&self, id: &str) -> Option<RewriteOperation> {
        self.operations.remove(id).map(|(_, op)| op)
    }

    /// Number of parked operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether nothing is parked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Drop operations started more than `ttl` before `now`.
    pub fn purge_older_than(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let Some(cutoff) = now.checked_sub_signed(ttl) else {
            return 0;
        };
        let before = self.operations.len();
        self.operations.retain(|id, op| {
            if op.created < cutoff {
                warn!(rewrite = %id, destination = %op.destination_object, "purging abandoned rewrite");
                false
            } else {
                true
            }
        });
        before.saturating_sub(self.operations.len())
    }

    /// Remove every operation.
    pub fn clear(&self) {
        self.operations.clear();
    }
}
