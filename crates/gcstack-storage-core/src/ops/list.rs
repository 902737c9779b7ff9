//! List operation handlers.
//!
//! Implements `list_objects` and `list_objects_iter`. Both are built on
//! [`ObjectListing`], a lazy cursor over one bucket's namespace that takes
//! the bucket's read lock only while refilling a small batch, so a long
//! listing never blocks writers for its whole duration.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use gcstack_storage_model::input::ListObjectsInput;
use gcstack_storage_model::output::{ListEntry, ListObjectsOutput};

use crate::error::StorageResult;
use crate::provider::GcStackStorage;
use crate::state::BucketState;
use crate::utils::{decode_token, encode_token};

/// Default page size for `list_objects`.
const DEFAULT_MAX_RESULTS: usize = 1000;

/// Entries gathered per read-lock acquisition.
const BATCH_SIZE: usize = 256;

/// Position in the `(name, generation)` order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Cursor {
    /// Last record consumed; scanning resumes strictly after it.
    #[serde(rename = "a", skip_serializing_if = "Option::is_none", default)]
    after: Option<(String, i64)>,
    /// Common prefix already emitted; names under it are skipped.
    #[serde(rename = "p", skip_serializing_if = "Option::is_none", default)]
    skip_prefix: Option<String>,
}

/// A lazy, restartable listing of one bucket.
///
/// Yields objects in `(name, generation)` order, with common prefixes
/// interleaved at the position of their first member. The sequence is
/// finite; [`ObjectListing::resume_token`] captures the position after the
/// last yielded entry so a later listing can pick up from there.
pub struct ObjectListing {
    bucket: Arc<BucketState>,
    prefix: String,
    delimiter: Option<String>,
    include_trailing_delimiter: bool,
    versions: bool,
    end_offset: Option<String>,
    scan: Cursor,
    yielded: Cursor,
    pending: VecDeque<(ListEntry, Cursor)>,
    exhausted: bool,
}

impl std::fmt::Debug for ObjectListing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectListing")
            .field("bucket", &self.bucket.name)
            .field("prefix", &self.prefix)
            .field("delimiter", &self.delimiter)
            .field("pending", &self.pending.len())
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl ObjectListing {
    fn new(bucket: Arc<BucketState>, input: &ListObjectsInput) -> StorageResult<Self> {
        let prefix = input.prefix.clone().unwrap_or_default();
        let start = match input.start_offset.as_deref() {
            Some(start) if start > prefix.as_str() => start.to_owned(),
            _ => prefix.clone(),
        };
        let scan = match input.page_token.as_deref() {
            Some(token) => decode_token(token)?,
            None if start.is_empty() => Cursor::default(),
            None => Cursor {
                after: Some((start, i64::MIN)),
                skip_prefix: None,
            },
        };
        Ok(Self {
            bucket,
            prefix,
            delimiter: input.delimiter.clone().filter(|d| !d.is_empty()),
            include_trailing_delimiter: input.include_trailing_delimiter,
            versions: input.versions,
            end_offset: input.end_offset.clone().filter(|e| !e.is_empty()),
            yielded: scan.clone(),
            scan,
            pending: VecDeque::new(),
            exhausted: false,
        })
    }

    /// Token resuming this listing after the last yielded entry.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StorageError::Internal`] if the cursor cannot
    /// be encoded.
    pub fn resume_token(&self) -> StorageResult<String> {
        encode_token(&self.yielded)
    }

    /// Whether another entry remains.
    pub fn has_more(&mut self) -> bool {
        if self.pending.is_empty() && !self.exhausted {
            self.fill();
        }
        !self.pending.is_empty()
    }

    /// Gather up to one batch of entries under the bucket read lock.
    fn fill(&mut self) {
        let objects = self.bucket.objects.read();
        if self.bucket.is_deleted() {
            self.exhausted = true;
            return;
        }

        let mut cursor = self.scan.clone();
        let position = cursor.after.clone();
        let mut finished = true;
        for stored in objects.after(position.as_ref().map(|(n, g)| (n.as_str(), *g))) {
            if self.pending.len() >= BATCH_SIZE {
                finished = false;
                break;
            }
            let object = &stored.resource;
            let name = object.name.as_str();
            if !name.starts_with(&self.prefix) {
                // Every later name sorts after the prefix range too.
                break;
            }
            if self.end_offset.as_deref().is_some_and(|end| name >= end) {
                break;
            }
            cursor.after = Some((object.name.clone(), object.generation));

            if !self.versions && !objects.is_live(name, object.generation) {
                continue;
            }

            if let Some(skip) = cursor.skip_prefix.as_deref() {
                if name.starts_with(skip) {
                    if self.include_trailing_delimiter && name == skip {
                        self.pending
                            .push_back((ListEntry::Object(Box::new(object.clone())), cursor.clone()));
                    }
                    continue;
                }
                cursor.skip_prefix = None;
            }

            let rolled_up = self.delimiter.as_deref().and_then(|delimiter| {
                let rest = &name[self.prefix.len()..];
                rest.find(delimiter).map(|pos| {
                    let end = self.prefix.len() + pos + delimiter.len();
                    name[..end].to_owned()
                })
            });
            match rolled_up {
                Some(common) => {
                    if self.include_trailing_delimiter && name == common {
                        let mut at_object = cursor.clone();
                        at_object.skip_prefix = None;
                        self.pending
                            .push_back((ListEntry::Object(Box::new(object.clone())), at_object));
                    }
                    cursor.skip_prefix = Some(common.clone());
                    self.pending
                        .push_back((ListEntry::Prefix(common), cursor.clone()));
                }
                None => {
                    self.pending
                        .push_back((ListEntry::Object(Box::new(object.clone())), cursor.clone()));
                }
            }
        }
        trace!(bucket = %self.bucket.name, batch = self.pending.len(), finished, "listing batch filled");
        self.scan = cursor;
        self.exhausted = finished;
    }
}

impl Iterator for ObjectListing {
    type Item = ListEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_more() {
            return None;
        }
        let (entry, cursor) = self.pending.pop_front()?;
        self.yielded = cursor;
        Some(entry)
    }
}

impl GcStackStorage {
    /// Start a lazy listing of a bucket.
    ///
    /// # Errors
    ///
    /// `NotFound` if the bucket does not exist, `InvalidArgument` for a page
    /// token this store did not mint.
    pub fn list_objects_iter(&self, input: &ListObjectsInput) -> StorageResult<ObjectListing> {
        let bucket = self.state.get_bucket(&input.bucket)?;
        ObjectListing::new(bucket, input)
    }

    /// List one page of a bucket.
    ///
    /// # Errors
    ///
    /// As [`GcStackStorage::list_objects_iter`].
    pub fn list_objects(&self, input: ListObjectsInput) -> StorageResult<ListObjectsOutput> {
        let max_results = input
            .max_results
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_RESULTS);
        let mut listing = self.list_objects_iter(&input)?;

        let mut output = ListObjectsOutput::default();
        for entry in listing.by_ref().take(max_results) {
            match entry {
                ListEntry::Object(object) => output.items.push(*object),
                ListEntry::Prefix(prefix) => output.prefixes.push(prefix),
            }
        }
        if listing.has_more() {
            output.next_page_token = Some(listing.resume_token()?);
        }

        debug!(
            bucket = %input.bucket,
            items = output.items.len(),
            prefixes = output.prefixes.len(),
            truncated = output.next_page_token.is_some(),
            "list_objects completed"
        );
        Ok(output)
    }
}
