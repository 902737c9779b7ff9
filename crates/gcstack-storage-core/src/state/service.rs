//! Top-level storage state.
//!
//! [`StorageState`] owns the bucket table and enforces global bucket-name
//! uniqueness. Buckets are shared as `Arc<BucketState>` so an operation can
//! keep working on a bucket without holding a `DashMap` shard guard.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};

use gcstack_storage_model::Bucket;

use super::bucket::BucketState;
use crate::error::{StorageError, StorageResult};

/// All buckets in the store.
pub struct StorageState {
    buckets: DashMap<String, Arc<BucketState>>,
}

impl std::fmt::Debug for StorageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageState")
            .field("bucket_count", &self.buckets.len())
            .finish_non_exhaustive()
    }
}

impl Default for StorageState {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageState {
    /// Create a new, empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
        }
    }

    /// Register a new bucket.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::BucketAlreadyExists`] if the name is taken.
    pub fn create_bucket(&self, bucket: Bucket) -> StorageResult<Arc<BucketState>> {
        match self.buckets.entry(bucket.name.clone()) {
            Entry::Occupied(_) => Err(StorageError::BucketAlreadyExists {
                bucket: bucket.name,
            }),
            Entry::Vacant(slot) => {
                let name = bucket.name.clone();
                let state = Arc::new(BucketState::new(bucket));
                slot.insert(Arc::clone(&state));
                info!(bucket = %name, "bucket created");
                Ok(state)
            }
        }
    }

    /// Look up a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchBucket`] if the bucket does not exist.
    pub fn get_bucket(&self, name: &str) -> StorageResult<Arc<BucketState>> {
        self.buckets
            .get(name)
            .map(|b| Arc::clone(b.value()))
            .ok_or_else(|| StorageError::NoSuchBucket {
                bucket: name.to_owned(),
            })
    }

    /// Unregister `bucket`, if it is still the one registered under its
    /// name.
    pub(crate) fn remove_bucket(&self, bucket: &Arc<BucketState>) {
        if self
            .buckets
            .remove_if(&bucket.name, |_, current| Arc::ptr_eq(current, bucket))
            .is_some()
        {
            info!(bucket = %bucket.name, "bucket deleted");
        }
    }

    /// Snapshot every bucket resource, sorted by name.
    #[must_use]
    pub fn list_buckets(&self) -> Vec<Bucket> {
        let mut buckets: Vec<Bucket> = self
            .buckets
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        buckets
    }

    /// Check whether a bucket exists.
    #[must_use]
    pub fn bucket_exists(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    /// Remove every bucket.
    pub fn reset(&self) {
        debug!("resetting all storage state");
        for entry in &self.buckets {
            let mut objects = entry.value().objects.write();
            entry.value().mark_deleted();
            objects.clear();
        }
        self.buckets.clear();
    }
}
