//! In-memory, generation-versioned object storage engine.
//!
//! This crate emulates the object-storage semantics client libraries test
//! against: buckets, generation-versioned objects with generation and
//! metageneration preconditions, resumable uploads, compose, and the
//! multi-call rewrite protocol. It is transport agnostic; an HTTP or gRPC
//! adaptor decodes requests into the inputs from `gcstack-storage-model`
//! and calls the methods on [`GcStackStorage`].
//!
//! # Architecture
//!
//! ```text
//! transport adaptor (REST / RPC)
//!        |
//!        v
//! GcStackStorage (ops::*)
//!        |          \
//!        |           UploadSessions / RewriteOperations
//!        v          /
//!   StorageState (buckets -> ObjectTable)
//! ```
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use gcstack_storage_core::{GcStackStorage, StorageConfig};
//! use gcstack_storage_model::input::{CreateBucketInput, GetObjectInput, InsertObjectInput};
//!
//! let storage = GcStackStorage::new(StorageConfig::default());
//! storage
//!     .create_bucket(CreateBucketInput {
//!         name: "photos".to_owned(),
//!         ..CreateBucketInput::default()
//!     })
//!     .unwrap();
//! let object = storage
//!     .insert_object(InsertObjectInput {
//!         bucket: "photos".to_owned(),
//!         name: "cat.jpg".to_owned(),
//!         data: Bytes::from_static(b"meow"),
//!         ..InsertObjectInput::default()
//!     })
//!     .unwrap();
//! let fetched = storage
//!     .get_object(GetObjectInput {
//!         bucket: "photos".to_owned(),
//!         name: "cat.jpg".to_owned(),
//!         ..GetObjectInput::default()
//!     })
//!     .unwrap();
//! assert_eq!(fetched.generation, object.generation);
//! ```

pub mod checksums;
pub mod clock;
pub mod config;
pub mod error;
mod ops;
pub mod precondition;
pub mod provider;
pub mod state;
pub mod utils;
pub mod validation;

pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use ops::compose::MAX_COMPOSE_SOURCES;
pub use ops::list::ObjectListing;
pub use ops::upload::{TRANSFER_ENCODING_KEY, UPLOAD_PROVENANCE_KEY};
pub use provider::GcStackStorage;
