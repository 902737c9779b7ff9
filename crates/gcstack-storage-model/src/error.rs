//! Error codes and their wire mapping.
//!
//! [`StorageErrorCode`] is the closed taxonomy every core operation reports.
//! Translating a code to an HTTP status or a gRPC status name happens here,
//! at the adaptor boundary, and nowhere inside the engine.

use std::fmt;

use http::StatusCode;

/// Storage error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageErrorCode {
    /// The bucket, object, upload or generation does not exist.
    NotFound,
    /// The resource already exists.
    AlreadyExists,
    /// A name, field, range or parameter is malformed or inconsistent.
    InvalidArgument,
    /// A generation, metageneration or ETag precondition did not hold.
    PreconditionFailed,
    /// A client-declared checksum does not match the received content.
    ChecksumMismatch,
    /// The request implies functionality the emulator does not provide.
    Unimplemented,
    /// Unexpected internal failure.
    Internal,
}

impl StorageErrorCode {
    /// HTTP status used by the JSON and XML APIs.
    #[must_use]
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::InvalidArgument | Self::ChecksumMismatch => StatusCode::BAD_REQUEST,
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Self::Unimplemented => StatusCode::NOT_IMPLEMENTED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Canonical gRPC status name.
    #[must_use]
    pub fn grpc_status(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::InvalidArgument | Self::ChecksumMismatch => "INVALID_ARGUMENT",
            Self::PreconditionFailed => "FAILED_PRECONDITION",
            Self::Unimplemented => "UNIMPLEMENTED",
            Self::Internal => "INTERNAL",
        }
    }

    /// Reason string reported in JSON API error bodies.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound => "notFound",
            Self::AlreadyExists => "conflict",
            Self::InvalidArgument => "invalid",
            Self::PreconditionFailed => "conditionNotMet",
            Self::ChecksumMismatch => "invalidChecksum",
            Self::Unimplemented => "notImplemented",
            Self::Internal => "backendError",
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.grpc_status())
    }
}

/// Error produced while normalizing a transport request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// A parameter is present but cannot be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidParameter {
        /// Parameter name as it appears on the wire.
        name: String,
        /// The offending raw value.
        value: String,
    },

    /// The `Content-Range` header is malformed.
    #[error("malformed Content-Range: {0:?}")]
    MalformedContentRange(String),

    /// The `x-goog-hash` header is malformed.
    #[error("malformed x-goog-hash: {0:?}")]
    MalformedHash(String),
}

impl RequestError {
    /// Every request error is a client error.
    #[must_use]
    pub fn code(&self) -> StorageErrorCode {
        StorageErrorCode::InvalidArgument
    }
}
