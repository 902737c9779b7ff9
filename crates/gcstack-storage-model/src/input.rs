//! Operation inputs.
//!
//! Every core operation takes one of these structs. All of them derive
//! [`Default`] so callers can set only the fields they care about:
//!
//! ```
//! use gcstack_storage_model::input::GetObjectInput;
//! use gcstack_storage_model::Preconditions;
//!
//! let input = GetObjectInput {
//!     bucket: "b1".to_owned(),
//!     name: "f".to_owned(),
//!     preconditions: Preconditions::generation_match(7),
//!     ..GetObjectInput::default()
//! };
//! assert_eq!(input.generation, None);
//! ```

use bytes::Bytes;

use crate::types::{
    BucketAttributes, BucketPatch, BucketPreconditions, ContentRange, DeclaredChecksums,
    ObjectAttributes, ObjectPatch, Preconditions, SourcePreconditions,
};

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// Input for `create_bucket`.
#[derive(Debug, Clone, Default)]
pub struct CreateBucketInput {
    /// Bucket name.
    pub name: String,
    /// Owning project; the configured project when absent.
    pub project: Option<String>,
    /// Initial attributes.
    pub attributes: BucketAttributes,
}

/// Input for `get_bucket`.
#[derive(Debug, Clone, Default)]
pub struct GetBucketInput {
    /// Bucket name.
    pub name: String,
    /// Metageneration conditions.
    pub preconditions: BucketPreconditions,
}

/// Input for `delete_bucket`.
#[derive(Debug, Clone, Default)]
pub struct DeleteBucketInput {
    /// Bucket name.
    pub name: String,
    /// Metageneration conditions.
    pub preconditions: BucketPreconditions,
}

/// Input for `list_buckets`.
#[derive(Debug, Clone, Default)]
pub struct ListBucketsInput {
    /// Restrict to buckets owned by this project.
    pub project: Option<String>,
    /// Restrict to names starting with this prefix.
    pub prefix: Option<String>,
}

/// Input for `update_bucket`.
#[derive(Debug, Clone, Default)]
pub struct UpdateBucketInput {
    /// Bucket name.
    pub name: String,
    /// Replacement attributes.
    pub attributes: BucketAttributes,
    /// Metageneration conditions.
    pub preconditions: BucketPreconditions,
}

/// Input for `patch_bucket`.
#[derive(Debug, Clone, Default)]
pub struct PatchBucketInput {
    /// Bucket name.
    pub name: String,
    /// Fields to change.
    pub patch: BucketPatch,
    /// Metageneration conditions.
    pub preconditions: BucketPreconditions,
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// Input for `insert_object`.
#[derive(Debug, Clone, Default)]
pub struct InsertObjectInput {
    /// Target bucket.
    pub bucket: String,
    /// Object name.
    pub name: String,
    /// Full content.
    pub data: Bytes,
    /// Object attributes.
    pub attributes: ObjectAttributes,
    /// Checksums declared by the client.
    pub checksums: DeclaredChecksums,
    /// Conditions on the current live generation.
    pub preconditions: Preconditions,
    /// Predefined ACL name, carried verbatim.
    pub predefined_acl: Option<String>,
}

/// Input for `get_object`.
#[derive(Debug, Clone, Default)]
pub struct GetObjectInput {
    /// Bucket.
    pub bucket: String,
    /// Object name.
    pub name: String,
    /// Explicit generation; `None` or `Some(0)` means the live one.
    pub generation: Option<i64>,
    /// Conditions on the resolved generation.
    pub preconditions: Preconditions,
}

/// Input for `read_object_media`.
#[derive(Debug, Clone, Default)]
pub struct ReadObjectInput {
    /// Bucket.
    pub bucket: String,
    /// Object name.
    pub name: String,
    /// Explicit generation; `None` or `Some(0)` means the live one.
    pub generation: Option<i64>,
    /// Conditions on the resolved generation.
    pub preconditions: Preconditions,
    /// `Range` header value such as `bytes=0-99`.
    pub range: Option<String>,
}

/// Input for `update_object`.
#[derive(Debug, Clone, Default)]
pub struct UpdateObjectInput {
    /// Bucket.
    pub bucket: String,
    /// Object name.
    pub name: String,
    /// Explicit generation; `None` or `Some(0)` means the live one.
    pub generation: Option<i64>,
    /// Replacement attributes.
    pub attributes: ObjectAttributes,
    /// Conditions on the resolved generation.
    pub preconditions: Preconditions,
}

/// Input for `patch_object`.
#[derive(Debug, Clone, Default)]
pub struct PatchObjectInput {
    /// Bucket.
    pub bucket: String,
    /// Object name.
    pub name: String,
    /// Explicit generation; `None` or `Some(0)` means the live one.
    pub generation: Option<i64>,
    /// Fields to change.
    pub patch: ObjectPatch,
    /// Conditions on the resolved generation.
    pub preconditions: Preconditions,
}

/// Input for `delete_object`.
#[derive(Debug, Clone, Default)]
pub struct DeleteObjectInput {
    /// Bucket.
    pub bucket: String,
    /// Object name.
    pub name: String,
    /// Explicit generation; `None` or `Some(0)` means the live one.
    pub generation: Option<i64>,
    /// Conditions on the resolved generation.
    pub preconditions: Preconditions,
}

/// Input for `list_objects` and `list_objects_iter`.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsInput {
    /// Bucket.
    pub bucket: String,
    /// Only names starting with this prefix.
    pub prefix: Option<String>,
    /// Roll names up to common prefixes at this delimiter.
    pub delimiter: Option<String>,
    /// Also list objects whose name ends at the first delimiter.
    pub include_trailing_delimiter: bool,
    /// Include non-live generations.
    pub versions: bool,
    /// Inclusive lower bound on names.
    pub start_offset: Option<String>,
    /// Exclusive upper bound on names.
    pub end_offset: Option<String>,
    /// Page size for `list_objects`; objects and prefixes both count.
    pub max_results: Option<usize>,
    /// Resume after the entry this token was minted for.
    pub page_token: Option<String>,
}

/// One source of a compose request.
#[derive(Debug, Clone, Default)]
pub struct ComposeSource {
    /// Source object name, in the destination bucket.
    pub name: String,
    /// Explicit generation; `None` means the live one.
    pub generation: Option<i64>,
    /// Fail unless the resolved generation equals this value.
    pub if_generation_match: Option<i64>,
}

impl ComposeSource {
    /// A source addressing the live generation of `name`.
    #[must_use]
    pub fn live(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Input for `compose_object`.
#[derive(Debug, Clone, Default)]
pub struct ComposeObjectInput {
    /// Bucket holding the sources and the destination.
    pub bucket: String,
    /// Destination object name.
    pub destination: String,
    /// Sources, concatenated in order.
    pub sources: Vec<ComposeSource>,
    /// Destination attributes.
    pub attributes: ObjectAttributes,
    /// Conditions on the destination's live generation.
    pub preconditions: Preconditions,
}

/// Input for `copy_object`.
#[derive(Debug, Clone, Default)]
pub struct CopyObjectInput {
    /// Source bucket.
    pub source_bucket: String,
    /// Source object name.
    pub source_object: String,
    /// Explicit source generation; `None` means the live one.
    pub source_generation: Option<i64>,
    /// Destination bucket.
    pub destination_bucket: String,
    /// Destination object name.
    pub destination_object: String,
    /// Destination attributes; the source's when absent.
    pub attributes: Option<ObjectAttributes>,
    /// Conditions on the destination's live generation.
    pub preconditions: Preconditions,
    /// Conditions on the source generation.
    pub source_preconditions: SourcePreconditions,
}

/// Input for `rewrite_object`.
#[derive(Debug, Clone, Default)]
pub struct RewriteObjectInput {
    /// Source bucket.
    pub source_bucket: String,
    /// Source object name.
    pub source_object: String,
    /// Explicit source generation; `None` means the live one.
    pub source_generation: Option<i64>,
    /// Destination bucket.
    pub destination_bucket: String,
    /// Destination object name.
    pub destination_object: String,
    /// Destination attributes; the source's when absent.
    pub attributes: Option<ObjectAttributes>,
    /// Conditions on the destination's live generation.
    pub preconditions: Preconditions,
    /// Conditions on the source generation.
    pub source_preconditions: SourcePreconditions,
    /// `destinationPredefinedAcl`, carried verbatim.
    pub destination_predefined_acl: Option<String>,
    /// `destinationKmsKeyName`.
    pub destination_kms_key_name: Option<String>,
    /// Requested per-call byte budget.
    pub max_bytes_rewritten_per_call: Option<i64>,
    /// Continuation token from a previous call.
    pub rewrite_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Resumable uploads
// ---------------------------------------------------------------------------

/// Input for `start_resumable_upload`.
#[derive(Debug, Clone, Default)]
pub struct StartResumableUploadInput {
    /// Target bucket.
    pub bucket: String,
    /// Object name.
    pub name: String,
    /// Draft object attributes.
    pub attributes: ObjectAttributes,
    /// Conditions evaluated at finalization.
    pub preconditions: Preconditions,
    /// Checksums of the full content, validated at finalization.
    pub checksums: DeclaredChecksums,
    /// Predefined ACL name, carried verbatim.
    pub predefined_acl: Option<String>,
}

/// Input for `upload_chunk`.
#[derive(Debug, Clone, Default)]
pub struct UploadChunkInput {
    /// Session id returned by `start_resumable_upload`.
    pub upload_id: String,
    /// Parsed `Content-Range`; `None` means a single final chunk.
    pub range: Option<ContentRange>,
    /// Chunk payload.
    pub data: Bytes,
    /// Treat a wildcard-total chunk as the last one.
    pub finalize: bool,
    /// `Transfer-Encoding` or `Content-Encoding` hint seen on this chunk.
    pub transfer_encoding: Option<String>,
}
