//! Bucket state.
//!
//! A [`BucketState`] holds the bucket resource and its object namespace
//! behind two independent `parking_lot::RwLock`s. When both are needed the
//! metadata lock is read and released before the object lock is taken; only
//! bucket deletion holds the object lock while touching metadata.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use gcstack_storage_model::Bucket;

use super::keystore::ObjectTable;
use crate::error::{StorageError, StorageResult};

/// One bucket and everything stored in it.
pub struct BucketState {
    /// Bucket name.
    pub name: String,
    /// Bucket resource.
    pub meta: RwLock<Bucket>,
    /// All retained object generations.
    pub objects: RwLock<ObjectTable>,
    deleted: AtomicBool,
}

impl std::fmt::Debug for BucketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let objects = self.objects.read();
        f.debug_struct("BucketState")
            .field("name", &self.name)
            .field("live_objects", &objects.live_count())
            .field("generations", &objects.version_count())
            .field("deleted", &self.is_deleted())
            .finish_non_exhaustive()
    }
}

impl BucketState {
    /// Wrap a freshly created bucket resource.
    #[must_use]
    pub fn new(bucket: Bucket) -> Self {
        Self {
            name: bucket.name.clone(),
            meta: RwLock::new(bucket),
            objects: RwLock::new(ObjectTable::default()),
            deleted: AtomicBool::new(false),
        }
    }

    /// A copy of the bucket resource.
    #[must_use]
    pub fn snapshot(&self) -> Bucket {
        self.meta.read().clone()
    }

    /// Whether non-live generations are retained.
    #[must_use]
    pub fn versioning_enabled(&self) -> bool {
        self.meta.read().versioning_enabled
    }

    /// Whether the bucket has been deleted. Writers that obtained this
    /// bucket before deletion must check this under the object lock.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Acquire)
    }

    /// Fail with `NoSuchBucket` once the bucket has been deleted. Call with
    /// the object lock held.
    pub(crate) fn ensure_live(&self) -> StorageResult<()> {
        if self.is_deleted() {
            return Err(StorageError::NoSuchBucket {
                bucket: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Mark the bucket deleted. Caller holds the object write lock.
    pub(crate) fn mark_deleted(&self) {
        debug!(bucket = %self.name, "marking bucket deleted");
        self.deleted.store(true, Ordering::Release);
    }
}
