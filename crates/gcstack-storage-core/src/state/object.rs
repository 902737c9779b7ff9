//! Stored object records.
//!
//! A [`StoredObject`] pairs one generation's resource metadata with its
//! immutable content. Metadata changes go through [`StoredObject::update`]
//! and [`StoredObject::patch`], both of which bump the metageneration.

use bytes::Bytes;
use chrono::{DateTime, Utc};

use gcstack_storage_model::{AclEntry, Object, ObjectAttributes, ObjectPatch};

use crate::checksums::{ObjectChecksums, compute_etag};

/// Default storage class when neither the object nor the bucket names one.
pub const DEFAULT_STORAGE_CLASS: &str = "STANDARD";

/// Everything needed to mint a new generation.
#[derive(Debug, Clone)]
pub struct NewObject {
    /// Bucket name.
    pub bucket: String,
    /// Object name.
    pub name: String,
    /// Full content.
    pub data: Bytes,
    /// Attributes supplied by the writer.
    pub attributes: ObjectAttributes,
    /// Whether to record an MD5 (composite objects have none).
    pub with_md5: bool,
    /// Component count for composite objects.
    pub component_count: Option<u32>,
}

/// One generation of an object.
#[derive(Clone)]
pub struct StoredObject {
    /// Resource metadata.
    pub resource: Object,
    /// Content bytes.
    pub data: Bytes,
}

impl std::fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredObject")
            .field("name", &self.resource.name)
            .field("generation", &self.resource.generation)
            .field("metageneration", &self.resource.metageneration)
            .field("size", &self.data.len())
            .finish()
    }
}

impl StoredObject {
    /// Build generation `generation` of `new`, with metageneration 1.
    ///
    /// `default_storage_class` and `default_acl` come from the bucket and
    /// apply only where the writer supplied nothing.
    #[must_use]
    pub fn create(
        new: NewObject,
        checksums: &ObjectChecksums,
        generation: i64,
        default_storage_class: &str,
        default_acl: &[AclEntry],
        now: DateTime<Utc>,
    ) -> Self {
        let NewObject {
            bucket,
            name,
            data,
            attributes,
            with_md5,
            component_count,
        } = new;
        let etag = compute_etag(&format!("{bucket}/{name}"), generation, 1);
        let acl = if attributes.acl.is_empty() {
            default_acl.to_vec()
        } else {
            attributes.acl
        };
        let resource = Object {
            bucket,
            name,
            generation,
            metageneration: 1,
            size: data.len() as u64,
            md5_hash: with_md5.then(|| checksums.md5_hash.clone()),
            crc32c: checksums.crc32c.clone(),
            etag,
            content_type: attributes.content_type,
            content_encoding: attributes.content_encoding,
            content_disposition: attributes.content_disposition,
            content_language: attributes.content_language,
            cache_control: attributes.cache_control,
            storage_class: attributes
                .storage_class
                .unwrap_or_else(|| default_storage_class.to_owned()),
            kms_key_name: attributes.kms_key_name,
            component_count,
            metadata: attributes.metadata,
            acl,
            time_created: now,
            updated: now,
        };
        Self { resource, data }
    }

    /// Replace every mutable attribute.
    pub fn update(&mut self, attributes: ObjectAttributes) {
        let r = &mut self.resource;
        r.content_type = attributes.content_type;
        r.content_encoding = attributes.content_encoding;
        r.content_disposition = attributes.content_disposition;
        r.content_language = attributes.content_language;
        r.cache_control = attributes.cache_control;
        if let Some(class) = attributes.storage_class {
            r.storage_class = class;
        }
        r.metadata = attributes.metadata;
        r.acl = attributes.acl;
        self.touch();
    }

    /// Merge only the fields present in `patch`.
    pub fn patch(&mut self, patch: ObjectPatch) {
        let r = &mut self.resource;
        if let Some(v) = patch.content_type {
            r.content_type = Some(v);
        }
        if let Some(v) = patch.content_encoding {
            r.content_encoding = Some(v);
        }
        if let Some(v) = patch.content_disposition {
            r.content_disposition = Some(v);
        }
        if let Some(v) = patch.content_language {
            r.content_language = Some(v);
        }
        if let Some(v) = patch.cache_control {
            r.cache_control = Some(v);
        }
        if let Some(changes) = patch.metadata {
            for (key, value) in changes {
                match value {
                    Some(value) => {
                        r.metadata.insert(key, value);
                    }
                    None => {
                        r.metadata.remove(&key);
                    }
                }
            }
        }
        if let Some(acl) = patch.acl {
            r.acl = acl;
        }
        self.touch();
    }

    /// Bump the metageneration and refresh the derived fields.
    fn touch(&mut self) {
        let r = &mut self.resource;
        r.metageneration += 1;
        r.etag = compute_etag(
            &format!("{}/{}", r.bucket, r.name),
            r.generation,
            r.metageneration,
        );
        r.updated = Utc::now();
    }
}
