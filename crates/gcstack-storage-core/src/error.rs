//! Storage engine error types.
//!
//! Defines [`StorageError`], the error every core operation returns. Each
//! variant maps to exactly one [`StorageErrorCode`] through
//! [`StorageError::code`]; adaptors turn that code into an HTTP status or a
//! gRPC status name.
//!
//! # Usage
//!
//! ```
//! use gcstack_storage_core::error::StorageError;
//! use gcstack_storage_model::StorageErrorCode;
//!
//! let err = StorageError::NoSuchBucket {
//!     bucket: "my-bucket".to_owned(),
//! };
//! assert_eq!(err.code(), StorageErrorCode::NotFound);
//! assert_eq!(err.code().http_status().as_u16(), 404);
//! ```

use gcstack_storage_model::{RequestError, StorageErrorCode};

/// Storage engine error type.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    // -----------------------------------------------------------------------
    // Not found
    // -----------------------------------------------------------------------
    /// The bucket does not exist.
    #[error("The specified bucket does not exist: {bucket}")]
    NoSuchBucket {
        /// The bucket name that was not found.
        bucket: String,
    },

    /// The object, or the requested generation of it, does not exist.
    #[error("No such object: {bucket}/{object}{}", .generation.map(|g| format!("#{g}")).unwrap_or_default())]
    NoSuchObject {
        /// Bucket name.
        bucket: String,
        /// Object name.
        object: String,
        /// Requested generation, if one was named.
        generation: Option<i64>,
    },

    /// The resumable upload session does not exist.
    #[error("No such upload session: {upload_id}")]
    NoSuchUpload {
        /// The upload id that was not found.
        upload_id: String,
    },

    // -----------------------------------------------------------------------
    // Conflicts
    // -----------------------------------------------------------------------
    /// The bucket name is already taken.
    #[error("The requested bucket name is not available: {bucket}")]
    BucketAlreadyExists {
        /// The bucket name that already exists.
        bucket: String,
    },

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------
    /// The bucket name is not valid.
    #[error("Invalid bucket name: {name}: {reason}")]
    InvalidBucketName {
        /// The invalid bucket name.
        name: String,
        /// Why it is invalid.
        reason: String,
    },

    /// The bucket still holds live objects.
    #[error("The bucket you tried to delete is not empty: {bucket}")]
    BucketNotEmpty {
        /// The bucket name.
        bucket: String,
    },

    /// An argument is malformed or inconsistent.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // -----------------------------------------------------------------------
    // Conditional requests
    // -----------------------------------------------------------------------
    /// A generation, metageneration or ETag precondition did not hold.
    #[error("Precondition failed: {message}")]
    PreconditionFailed {
        /// The condition that did not hold.
        message: String,
    },

    // -----------------------------------------------------------------------
    // Content
    // -----------------------------------------------------------------------
    /// A declared checksum does not match the content.
    #[error("Provided {algorithm} hash {expected} doesn't match calculated hash {actual}")]
    ChecksumMismatch {
        /// `md5` or `crc32c`.
        algorithm: &'static str,
        /// Declared (base64) value.
        expected: String,
        /// Computed (base64) value.
        actual: String,
    },

    // -----------------------------------------------------------------------
    // Internal / catch-all
    // -----------------------------------------------------------------------
    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl StorageError {
    /// The wire-independent code for this error.
    #[must_use]
    pub fn code(&self) -> StorageErrorCode {
        match self {
            Self::NoSuchBucket { .. } | Self::NoSuchObject { .. } | Self::NoSuchUpload { .. } => {
                StorageErrorCode::NotFound
            }
            Self::BucketAlreadyExists { .. } => StorageErrorCode::AlreadyExists,
            Self::InvalidBucketName { .. }
            | Self::BucketNotEmpty { .. }
            | Self::InvalidArgument { .. } => StorageErrorCode::InvalidArgument,
            Self::PreconditionFailed { .. } => StorageErrorCode::PreconditionFailed,
            Self::ChecksumMismatch { .. } => StorageErrorCode::ChecksumMismatch,
            Self::Internal(_) => StorageErrorCode::Internal,
        }
    }

    /// Shorthand for [`StorageError::InvalidArgument`].
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for [`StorageError::PreconditionFailed`].
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            message: message.into(),
        }
    }
}

impl From<RequestError> for StorageError {
    fn from(err: RequestError) -> Self {
        Self::InvalidArgument {
            message: err.to_string(),
        }
    }
}

/// Convenience result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
