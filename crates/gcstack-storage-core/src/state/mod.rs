//! In-memory storage state.
//!
//! - [`StorageState`] -- the bucket table
//! - [`BucketState`] -- one bucket's resource and object namespace
//! - [`ObjectTable`] / [`StoredObject`] -- generations and their content
//! - [`UploadSessions`] / [`UploadSession`] -- resumable uploads
//! - [`RewriteOperations`] / [`RewriteOperation`] -- in-flight rewrites
//!
//! # Thread Safety
//!
//! All types are `Send + Sync`. Concurrent access is handled via:
//!
//! - `DashMap` for the bucket, upload and rewrite tables
//! - `parking_lot::RwLock` for per-bucket metadata and the object namespace
//! - `parking_lot::Mutex` per upload session

pub(crate) mod bucket;
pub(crate) mod keystore;
pub(crate) mod object;
pub(crate) mod rewrite;
pub(crate) mod service;
pub(crate) mod upload;

pub use bucket::BucketState;
pub use keystore::ObjectTable;
pub use object::{DEFAULT_STORAGE_CLASS, NewObject, StoredObject};
pub use rewrite::{RewriteFingerprint, RewriteOperation, RewriteOperations, RewriteToken};
pub use service::StorageState;
pub use upload::{UploadSession, UploadSessions};
