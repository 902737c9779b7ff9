//! Object operation handlers.
//!
//! Implements `insert_object`, `get_object`, `read_object_media`,
//! `update_object`, `patch_object` and `delete_object`, plus the commit path
//! every writer (insert, resumable upload, compose, rewrite) goes through.

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, trace};

use gcstack_storage_model::input::{
    DeleteObjectInput, GetObjectInput, InsertObjectInput, PatchObjectInput, ReadObjectInput,
    UpdateObjectInput,
};
use gcstack_storage_model::output::ReadObjectOutput;
use gcstack_storage_model::{DeclaredChecksums, Object, ObjectAttributes, Preconditions};

use crate::checksums::ObjectChecksums;
use crate::error::{StorageError, StorageResult};
use crate::precondition::check_object;
use crate::provider::GcStackStorage;
use crate::state::{NewObject, StoredObject};
use crate::utils::parse_range_header;
use crate::validation::validate_object_name;

/// A fully assembled write, ready to become a new generation.
#[derive(Debug, Clone)]
pub(crate) struct PendingWrite {
    pub bucket: String,
    pub name: String,
    pub data: Bytes,
    pub attributes: ObjectAttributes,
    pub checksums: DeclaredChecksums,
    pub preconditions: Preconditions,
    pub with_md5: bool,
    pub component_count: Option<u32>,
}

impl PendingWrite {
    /// A plain single-object write.
    pub(crate) fn new(bucket: String, name: String, data: Bytes) -> Self {
        Self {
            bucket,
            name,
            data,
            attributes: ObjectAttributes::default(),
            checksums: DeclaredChecksums::default(),
            preconditions: Preconditions::default(),
            with_md5: true,
            component_count: None,
        }
    }
}

pub(crate) fn no_such_object(bucket: &str, name: &str, generation: Option<i64>) -> StorageError {
    StorageError::NoSuchObject {
        bucket: bucket.to_owned(),
        object: name.to_owned(),
        generation: generation.filter(|g| *g != 0),
    }
}

impl GcStackStorage {
    /// Store a new generation of an object.
    ///
    /// # Errors
    ///
    /// `NotFound` if the bucket does not exist, `InvalidArgument` for an
    /// invalid name, `ChecksumMismatch` if a declared digest differs, and
    /// `PreconditionFailed` if a condition on the current live generation
    /// fails.
    pub fn insert_object(&self, input: InsertObjectInput) -> StorageResult<Object> {
        if let Some(acl) = &input.predefined_acl {
            trace!(bucket = %input.bucket, object = %input.name, predefined_acl = %acl, "predefined ACL left to the adaptor");
        }
        self.commit(PendingWrite {
            attributes: input.attributes,
            checksums: input.checksums,
            preconditions: input.preconditions,
            ..PendingWrite::new(input.bucket, input.name, input.data)
        })
    }

    /// Validate and commit a write.
    ///
    /// Checksums are verified before any lock is taken. Preconditions are
    /// evaluated and the generation is assigned under the bucket's object
    /// write lock, so concurrent conditional writers serialize.
    pub(crate) fn commit(&self, write: PendingWrite) -> StorageResult<Object> {
        validate_object_name(&write.name)?;
        let computed = ObjectChecksums::compute(&write.data);
        computed.verify(&write.checksums)?;

        let bucket = self.state.get_bucket(&write.bucket)?;
        let (versioning, storage_class, default_acl) = {
            let meta = bucket.meta.read();
            (
                meta.versioning_enabled,
                meta.storage_class.clone(),
                meta.default_object_acl.clone(),
            )
        };

        let mut objects = bucket.objects.write();
        bucket.ensure_live()?;
        check_object(
            &write.preconditions,
            objects.live(&write.name).map(|o| &o.resource),
        )?;

        let generation = self.clock.next_generation();
        let stored = StoredObject::create(
            NewObject {
                bucket: write.bucket,
                name: write.name,
                data: write.data,
                attributes: write.attributes,
                with_md5: write.with_md5,
                component_count: write.component_count,
            },
            &computed,
            generation,
            &storage_class,
            &default_acl,
            Utc::now(),
        );
        let resource = stored.resource.clone();
        objects.insert(stored, versioning);
        drop(objects);

        debug!(
            bucket = %resource.bucket,
            object = %resource.name,
            generation = resource.generation,
            size = resource.size,
            "object committed"
        );
        Ok(resource)
    }

    /// Fetch object metadata.
    ///
    /// # Errors
    ///
    /// `NotFound` if the bucket, object or generation does not exist;
    /// `PreconditionFailed` if a condition on the resolved generation fails.
    pub fn get_object(&self, input: GetObjectInput) -> StorageResult<Object> {
        let bucket = self.state.get_bucket(&input.bucket)?;
        let objects = bucket.objects.read();
        bucket.ensure_live()?;
        let object = objects
            .resolve(&input.name, input.generation)
            .ok_or_else(|| no_such_object(&input.bucket, &input.name, input.generation))?;
        check_object(&input.preconditions, Some(&object.resource))?;
        Ok(object.resource.clone())
    }

    /// Fetch object metadata and content, optionally a byte range of it.
    ///
    /// # Errors
    ///
    /// As [`GcStackStorage::get_object`], plus `InvalidArgument` for an
    /// unsatisfiable range.
    pub fn read_object_media(&self, input: ReadObjectInput) -> StorageResult<ReadObjectOutput> {
        let (object, data) = {
            let bucket = self.state.get_bucket(&input.bucket)?;
            let objects = bucket.objects.read();
            bucket.ensure_live()?;
            let stored = objects
                .resolve(&input.name, input.generation)
                .ok_or_else(|| no_such_object(&input.bucket, &input.name, input.generation))?;
            check_object(&input.preconditions, Some(&stored.resource))?;
            (stored.resource.clone(), stored.data.clone())
        };

        let Some(range) = input.range.as_deref() else {
            return Ok(ReadObjectOutput {
                object,
                data,
                range: None,
            });
        };
        let (start, end) = parse_range_header(range, data.len() as u64)?;
        let (lo, hi) = (
            usize::try_from(start).map_err(anyhow::Error::from)?,
            usize::try_from(end).map_err(anyhow::Error::from)?,
        );
        trace!(object = %object.name, start, end, "serving byte range");
        Ok(ReadObjectOutput {
            object,
            data: data.slice(lo..=hi),
            range: Some((start, end)),
        })
    }

    /// Replace the mutable metadata of one generation.
    ///
    /// # Errors
    ///
    /// `NotFound` or `PreconditionFailed`.
    pub fn update_object(&self, input: UpdateObjectInput) -> StorageResult<Object> {
        self.modify_object(
            &input.bucket,
            &input.name,
            input.generation,
            &input.preconditions,
            |stored| stored.update(input.attributes),
        )
    }

    /// Merge the fields present in the patch into one generation.
    ///
    /// # Errors
    ///
    /// `NotFound` or `PreconditionFailed`.
    pub fn patch_object(&self, input: PatchObjectInput) -> StorageResult<Object> {
        self.modify_object(
            &input.bucket,
            &input.name,
            input.generation,
            &input.preconditions,
            |stored| stored.patch(input.patch),
        )
    }

    /// Physically remove one generation (the live one by default).
    ///
    /// # Errors
    ///
    /// `NotFound` or `PreconditionFailed`.
    pub fn delete_object(&self, input: DeleteObjectInput) -> StorageResult<()> {
        let bucket = self.state.get_bucket(&input.bucket)?;
        let mut objects = bucket.objects.write();
        bucket.ensure_live()?;
        let generation = {
            let stored = objects
                .resolve(&input.name, input.generation)
                .ok_or_else(|| no_such_object(&input.bucket, &input.name, input.generation))?;
            check_object(&input.preconditions, Some(&stored.resource))?;
            stored.resource.generation
        };
        let was_live = objects.is_live(&input.name, generation);
        objects.remove(&input.name, generation);
        drop(objects);

        debug!(
            bucket = %input.bucket,
            object = %input.name,
            generation,
            was_live,
            "delete_object completed"
        );
        Ok(())
    }

    /// Read-check-write the metadata of one generation under the bucket's
    /// object write lock.
    fn modify_object(
        &self,
        bucket: &str,
        name: &str,
        generation: Option<i64>,
        preconditions: &Preconditions,
        apply: impl FnOnce(&mut StoredObject),
    ) -> StorageResult<Object> {
        let state = self.state.get_bucket(bucket)?;
        let mut objects = state.objects.write();
        state.ensure_live()?;
        let stored = objects
            .resolve_mut(name, generation)
            .ok_or_else(|| no_such_object(bucket, name, generation))?;
        check_object(preconditions, Some(&stored.resource))?;
        apply(&mut *stored);
        debug!(
            bucket = %bucket,
            object = %name,
            generation = stored.resource.generation,
            metageneration = stored.resource.metageneration,
            "object metadata updated"
        );
        Ok(stored.resource.clone())
    }
}
