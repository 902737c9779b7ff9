//! Resource, request and error types for the GcStack storage emulator.
//!
//! This crate is transport-agnostic. It defines:
//!
//! - [`types`] -- bucket and object resources plus the attribute, patch,
//!   precondition and checksum types shared by every operation
//! - [`input`] / [`output`] -- one input struct per core operation and the
//!   results they produce
//! - [`request`] -- [`StorageRequest`], a tagged variant over REST-shaped and
//!   RPC-shaped payloads with normalized accessors
//! - [`error`] -- [`StorageErrorCode`] and its HTTP / gRPC wire mapping

pub mod error;
pub mod input;
pub mod output;
pub mod request;
pub mod types;

pub use error::{RequestError, StorageErrorCode};
pub use request::{RestRequest, RpcRequest, StorageRequest};
pub use types::{
    AclEntry, Bucket, BucketAttributes, BucketPatch, BucketPreconditions, ContentRange,
    DeclaredChecksums, Object, ObjectAttributes, ObjectPatch, Preconditions,
    SourcePreconditions,
};
