//! In-process scenario tests for the GcStack storage engine.
//!
//! Each test builds its own [`GcStackStorage`] and drives it through the
//! public operation set, the way a transport adaptor would. Concurrency
//! tests run on a multi-threaded tokio runtime and dispatch the synchronous
//! operations with `spawn_blocking`.
//!
//! ```text
//! cargo test -p gcstack-integration
//! ```

use std::sync::{Arc, Once};

use bytes::Bytes;
use gcstack_storage_core::clock::SequentialGenerations;
use gcstack_storage_core::{GcStackStorage, StorageConfig};
use gcstack_storage_model::input::{CreateBucketInput, InsertObjectInput, ReadObjectInput};
use gcstack_storage_model::{BucketAttributes, Object};

static INIT: Once = Once::new();

/// Initialize tracing (once). `RUST_LOG` wins over `LOG_LEVEL`.
fn init_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(StorageConfig::from_env().log_level))
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// A fresh store backed by the wall-clock generation source.
#[must_use]
pub fn storage() -> Arc<GcStackStorage> {
    init_tracing();
    Arc::new(GcStackStorage::new(StorageConfig::default()))
}

/// A fresh store whose generations are `1, 2, 3, ...`.
#[must_use]
pub fn sequential_storage() -> Arc<GcStackStorage> {
    init_tracing();
    Arc::new(GcStackStorage::with_generation_source(
        StorageConfig::default(),
        Arc::new(SequentialGenerations::default()),
    ))
}

/// Generate a unique, valid bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a bucket and return its name.
pub fn create_test_bucket(storage: &GcStackStorage, name: &str, versioning: bool) -> String {
    storage
        .create_bucket(CreateBucketInput {
            name: name.to_owned(),
            attributes: BucketAttributes {
                versioning_enabled: versioning,
                ..BucketAttributes::default()
            },
            ..CreateBucketInput::default()
        })
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
    name.to_owned()
}

/// Insert an object unconditionally.
pub fn put(storage: &GcStackStorage, bucket: &str, name: &str, data: impl Into<Bytes>) -> Object {
    storage
        .insert_object(InsertObjectInput {
            bucket: bucket.to_owned(),
            name: name.to_owned(),
            data: data.into(),
            ..InsertObjectInput::default()
        })
        .unwrap_or_else(|e| panic!("failed to insert {bucket}/{name}: {e}"))
}

/// Read the live content of an object.
pub fn read(storage: &GcStackStorage, bucket: &str, name: &str) -> Bytes {
    storage
        .read_object_media(ReadObjectInput {
            bucket: bucket.to_owned(),
            name: name.to_owned(),
            ..ReadObjectInput::default()
        })
        .unwrap_or_else(|e| panic!("failed to read {bucket}/{name}: {e}"))
        .data
}

/// `size` bytes of random content.
#[must_use]
pub fn random_payload(size: usize) -> Bytes {
    use rand::RngExt as _;

    let mut data = vec![0u8; size];
    rand::rng().fill(&mut data[..]);
    Bytes::from(data)
}

mod test_object;
mod test_precondition;
mod test_request;
mod test_rewrite;
mod test_upload;
