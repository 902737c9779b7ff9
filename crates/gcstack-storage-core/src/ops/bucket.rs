//! Bucket operation handlers.
//!
//! Implements `create_bucket`, `get_bucket`, `list_buckets`,
//! `update_bucket`, `patch_bucket` and `delete_bucket`.

use chrono::Utc;
use tracing::debug;

use gcstack_storage_model::input::{
    CreateBucketInput, DeleteBucketInput, GetBucketInput, ListBucketsInput, PatchBucketInput,
    UpdateBucketInput,
};
use gcstack_storage_model::output::ListBucketsOutput;
use gcstack_storage_model::{Bucket, BucketPreconditions};

use crate::checksums::compute_etag;
use crate::error::{StorageError, StorageResult};
use crate::precondition::check_bucket;
use crate::provider::GcStackStorage;
use crate::state::DEFAULT_STORAGE_CLASS;
use crate::validation::validate_bucket_name;

/// Bump the bucket metageneration and refresh its derived fields.
fn touch(bucket: &mut Bucket) {
    bucket.metageneration += 1;
    bucket.etag = compute_etag(&bucket.name, 0, bucket.metageneration);
    bucket.updated = Utc::now();
}

impl GcStackStorage {
    /// Create a bucket.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an invalid name, `AlreadyExists` if the name is
    /// taken.
    pub fn create_bucket(&self, input: CreateBucketInput) -> StorageResult<Bucket> {
        validate_bucket_name(&input.name)?;

        let now = Utc::now();
        let attrs = input.attributes;
        let bucket = Bucket {
            id: input.name.clone(),
            etag: compute_etag(&input.name, 0, 1),
            name: input.name,
            project_number: input
                .project
                .unwrap_or_else(|| self.config.project_id.clone()),
            metageneration: 1,
            location: attrs
                .location
                .unwrap_or_else(|| self.config.default_location.clone())
                .to_uppercase(),
            storage_class: attrs
                .storage_class
                .unwrap_or_else(|| DEFAULT_STORAGE_CLASS.to_owned()),
            versioning_enabled: attrs.versioning_enabled,
            labels: attrs.labels,
            acl: attrs.acl,
            default_object_acl: attrs.default_object_acl,
            time_created: now,
            updated: now,
        };

        let state = self.state.create_bucket(bucket)?;
        let bucket = state.snapshot();
        debug!(bucket = %bucket.name, "create_bucket completed");
        Ok(bucket)
    }

    /// Fetch a bucket resource.
    ///
    /// # Errors
    ///
    /// `NotFound` if the bucket does not exist, `PreconditionFailed` if a
    /// metageneration condition fails.
    pub fn get_bucket(&self, input: GetBucketInput) -> StorageResult<Bucket> {
        let bucket = self.state.get_bucket(&input.name)?.snapshot();
        check_bucket(&input.preconditions, bucket.metageneration)?;
        Ok(bucket)
    }

    /// List buckets sorted by name.
    #[must_use]
    pub fn list_buckets(&self, input: ListBucketsInput) -> ListBucketsOutput {
        let items = self
            .state
            .list_buckets()
            .into_iter()
            .filter(|b| {
                input
                    .project
                    .as_deref()
                    .is_none_or(|p| b.project_number == p)
            })
            .filter(|b| {
                input
                    .prefix
                    .as_deref()
                    .is_none_or(|p| b.name.starts_with(p))
            })
            .collect();
        ListBucketsOutput { items }
    }

    /// Replace every mutable bucket field.
    ///
    /// # Errors
    ///
    /// `NotFound` or `PreconditionFailed`.
    pub fn update_bucket(&self, input: UpdateBucketInput) -> StorageResult<Bucket> {
        self.modify_bucket(&input.name, &input.preconditions, |bucket| {
            let attrs = input.attributes;
            if let Some(location) = attrs.location {
                bucket.location = location.to_uppercase();
            }
            bucket.storage_class = attrs
                .storage_class
                .unwrap_or_else(|| DEFAULT_STORAGE_CLASS.to_owned());
            bucket.versioning_enabled = attrs.versioning_enabled;
            bucket.labels = attrs.labels;
            bucket.acl = attrs.acl;
            bucket.default_object_acl = attrs.default_object_acl;
        })
    }

    /// Apply only the fields present in the patch.
    ///
    /// # Errors
    ///
    /// `NotFound` or `PreconditionFailed`.
    pub fn patch_bucket(&self, input: PatchBucketInput) -> StorageResult<Bucket> {
        self.modify_bucket(&input.name, &input.preconditions, |bucket| {
            let patch = input.patch;
            if let Some(class) = patch.storage_class {
                bucket.storage_class = class;
            }
            if let Some(enabled) = patch.versioning_enabled {
                bucket.versioning_enabled = enabled;
            }
            if let Some(changes) = patch.labels {
                for (key, value) in changes {
                    match value {
                        Some(value) => {
                            bucket.labels.insert(key, value);
                        }
                        None => {
                            bucket.labels.remove(&key);
                        }
                    }
                }
            }
            if let Some(acl) = patch.acl {
                bucket.acl = acl;
            }
            if let Some(acl) = patch.default_object_acl {
                bucket.default_object_acl = acl;
            }
        })
    }

    /// Delete an empty bucket together with any non-live generations.
    ///
    /// # Errors
    ///
    /// `NotFound`, `PreconditionFailed`, or `InvalidArgument` if any live
    /// object remains.
    pub fn delete_bucket(&self, input: DeleteBucketInput) -> StorageResult<()> {
        let bucket = self.state.get_bucket(&input.name)?;
        {
            let mut objects = bucket.objects.write();
            bucket.ensure_live()?;
            check_bucket(&input.preconditions, bucket.meta.read().metageneration)?;
            if objects.live_count() > 0 {
                return Err(StorageError::BucketNotEmpty {
                    bucket: input.name,
                });
            }
            bucket.mark_deleted();
            objects.clear();
        }
        self.state.remove_bucket(&bucket);
        debug!(bucket = %input.name, "delete_bucket completed");
        Ok(())
    }

    /// Read-check-write a bucket resource under its metadata lock.
    fn modify_bucket(
        &self,
        name: &str,
        preconditions: &BucketPreconditions,
        apply: impl FnOnce(&mut Bucket),
    ) -> StorageResult<Bucket> {
        let state = self.state.get_bucket(name)?;
        let mut bucket = state.meta.write();
        if state.is_deleted() {
            return Err(StorageError::NoSuchBucket {
                bucket: name.to_owned(),
            });
        }
        check_bucket(preconditions, bucket.metageneration)?;
        apply(&mut bucket);
        touch(&mut bucket);
        debug!(bucket = %name, metageneration = bucket.metageneration, "bucket metadata updated");
        Ok(bucket.clone())
    }
}
