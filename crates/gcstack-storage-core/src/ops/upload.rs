//! Resumable upload handlers.
//!
//! Implements `start_resumable_upload`, `upload_chunk`,
//! `query_upload_status`, `cancel_upload` and `purge_expired`.
//!
//! A session moves from started, through receiving, to complete. Chunks
//! must arrive in order: each one starts exactly at the persisted size. When
//! the declared total is reached the accumulated bytes are committed through
//! the regular insert path with the preconditions and checksums captured at
//! start time.

use std::collections::BTreeSet;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace};

use gcstack_storage_model::input::{StartResumableUploadInput, UploadChunkInput};
use gcstack_storage_model::output::{PurgeSummary, ResumableUploadSession, UploadStatus};
use gcstack_storage_model::ContentRange;

use crate::error::{StorageError, StorageResult};
use crate::ops::object::PendingWrite;
use crate::provider::GcStackStorage;
use crate::state::UploadSession;
use crate::utils::{generate_upload_id, resumable_location};
use crate::validation::validate_object_name;

/// Metadata key marking objects written by a resumable upload.
pub const UPLOAD_PROVENANCE_KEY: &str = "x_emulator_upload";

/// Metadata key listing transfer-encoding hints seen during an upload.
pub const TRANSFER_ENCODING_KEY: &str = "x_emulator_transfer_encoding";

/// What a chunk asks the session to do.
enum ChunkAction {
    /// Report progress only.
    Report,
    /// Append the payload; finalize afterwards if set.
    Append { finalize: bool },
}

/// Classify a chunk against the session's persisted size.
///
/// `finalize` is the caller's explicit request to complete the upload; it
/// is only honored where the range leaves the total open or already reached.
fn classify(
    range: Option<ContentRange>,
    payload_len: u64,
    persisted: u64,
    finalize: bool,
) -> StorageResult<ChunkAction> {
    match range {
        Some(ContentRange::Query { total }) => {
            if payload_len > 0 {
                return Err(StorageError::invalid(
                    "a status query (bytes */TOTAL) must not carry a payload",
                ));
            }
            match total {
                Some(total) if total == persisted => Ok(ChunkAction::Append { finalize: true }),
                Some(total) if total < persisted => Err(StorageError::invalid(format!(
                    "declared total {total} is smaller than the {persisted} bytes already persisted"
                ))),
                Some(total) if finalize => Err(StorageError::invalid(format!(
                    "finalize requested at {persisted} bytes before the declared total {total}"
                ))),
                Some(_) => Ok(ChunkAction::Report),
                None if finalize => Ok(ChunkAction::Append { finalize: true }),
                None => Ok(ChunkAction::Report),
            }
        }
        Some(ContentRange::Chunk { first, last, total }) => {
            if first != persisted {
                return Err(StorageError::invalid(format!(
                    "chunk starts at offset {first}, expected {persisted}"
                )));
            }
            let end = last.checked_add(1).ok_or_else(|| {
                StorageError::invalid(format!("chunk end offset {last} is out of range"))
            })?;
            // `last >= first` is enforced when the range is parsed.
            let declared_len = end.saturating_sub(first);
            if declared_len != payload_len {
                return Err(StorageError::invalid(format!(
                    "Content-Range covers {declared_len} bytes but the payload has {payload_len}"
                )));
            }
            match total {
                Some(total) if end > total => Err(StorageError::invalid(format!(
                    "chunk ends at byte {last}, past the declared total {total}"
                ))),
                Some(total) if finalize && end != total => Err(StorageError::invalid(format!(
                    "finalize requested at byte {end} before the declared total {total}"
                ))),
                Some(total) => Ok(ChunkAction::Append {
                    finalize: end == total,
                }),
                None => Ok(ChunkAction::Append { finalize }),
            }
        }
        None => Ok(ChunkAction::Append { finalize: true }),
    }
}

impl GcStackStorage {
    /// Open a resumable upload session.
    ///
    /// # Errors
    ///
    /// `NotFound` if the bucket does not exist, `InvalidArgument` for an
    /// invalid object name.
    pub fn start_resumable_upload(
        &self,
        input: StartResumableUploadInput,
    ) -> StorageResult<ResumableUploadSession> {
        if !self.state.bucket_exists(&input.bucket) {
            return Err(StorageError::NoSuchBucket {
                bucket: input.bucket,
            });
        }
        validate_object_name(&input.name)?;

        let upload_id =
            generate_upload_id(&input.bucket, &input.name, self.next_upload_sequence());
        let location = resumable_location(&self.config.emulator_host, &input.bucket, &upload_id);
        self.uploads.insert(UploadSession {
            upload_id: upload_id.clone(),
            bucket: input.bucket,
            name: input.name,
            attributes: input.attributes,
            preconditions: input.preconditions,
            checksums: input.checksums,
            predefined_acl: input.predefined_acl,
            buffer: Vec::new(),
            transfer_encodings: BTreeSet::new(),
            created: Utc::now(),
            completed: None,
        });

        debug!(upload_id = %upload_id, "start_resumable_upload completed");
        Ok(ResumableUploadSession {
            upload_id,
            location,
        })
    }

    /// Apply one chunk (or status query) to a session.
    ///
    /// Chunks on a completed session return the finalized object. A failed
    /// finalization leaves the session as it was before the call.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown session; `InvalidArgument` for an
    /// out-of-order chunk or inconsistent range; `PreconditionFailed` or
    /// `ChecksumMismatch` from finalization.
    pub fn upload_chunk(&self, input: UploadChunkInput) -> StorageResult<UploadStatus> {
        let session = self
            .uploads
            .get(&input.upload_id)
            .ok_or_else(|| StorageError::NoSuchUpload {
                upload_id: input.upload_id.clone(),
            })?;
        let mut session = session.lock();
        if let Some(object) = &session.completed {
            return Ok(UploadStatus::Complete(Box::new(object.clone())));
        }

        let persisted = session.persisted_size();
        let finalize = match classify(
            input.range,
            input.data.len() as u64,
            persisted,
            input.finalize,
        )? {
            ChunkAction::Report => {
                return Ok(UploadStatus::Incomplete {
                    persisted_size: persisted,
                });
            }
            ChunkAction::Append { finalize } => finalize,
        };

        let hint = input
            .transfer_encoding
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty());
        let previous_len = session.buffer.len();
        session.buffer.extend_from_slice(&input.data);
        trace!(
            upload_id = %input.upload_id,
            received = input.data.len(),
            persisted = session.buffer.len(),
            "chunk accepted"
        );

        if !finalize {
            if let Some(hint) = hint {
                session.transfer_encodings.insert(hint.to_owned());
            }
            return Ok(UploadStatus::Incomplete {
                persisted_size: session.persisted_size(),
            });
        }

        let mut encodings = session.transfer_encodings.clone();
        if let Some(hint) = hint {
            encodings.insert(hint.to_owned());
        }
        let mut attributes = session.attributes.clone();
        attributes
            .metadata
            .insert(UPLOAD_PROVENANCE_KEY.to_owned(), "resumable".to_owned());
        if !encodings.is_empty() {
            let joined: Vec<&str> = encodings.iter().map(String::as_str).collect();
            attributes
                .metadata
                .insert(TRANSFER_ENCODING_KEY.to_owned(), joined.join(","));
        }

        let write = PendingWrite {
            attributes,
            checksums: session.checksums.clone(),
            preconditions: session.preconditions.clone(),
            ..PendingWrite::new(
                session.bucket.clone(),
                session.name.clone(),
                Bytes::copy_from_slice(&session.buffer),
            )
        };
        match self.commit(write) {
            Ok(object) => {
                session.buffer = Vec::new();
                session.transfer_encodings = encodings;
                session.completed = Some(object.clone());
                debug!(
                    upload_id = %input.upload_id,
                    generation = object.generation,
                    size = object.size,
                    "resumable upload finalized"
                );
                Ok(UploadStatus::Complete(Box::new(object)))
            }
            Err(e) => {
                session.buffer.truncate(previous_len);
                debug!(upload_id = %input.upload_id, error = %e, "resumable upload finalization failed");
                Err(e)
            }
        }
    }

    /// Report a session's progress, as a `bytes */*` query would.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown session.
    pub fn query_upload_status(&self, upload_id: &str) -> StorageResult<UploadStatus> {
        let session = self
            .uploads
            .get(upload_id)
            .ok_or_else(|| StorageError::NoSuchUpload {
                upload_id: upload_id.to_owned(),
            })?;
        let session = session.lock();
        Ok(match &session.completed {
            Some(object) => UploadStatus::Complete(Box::new(object.clone())),
            None => UploadStatus::Incomplete {
                persisted_size: session.persisted_size(),
            },
        })
    }

    /// Abandon a session.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown session.
    pub fn cancel_upload(&self, upload_id: &str) -> StorageResult<()> {
        if !self.uploads.remove(upload_id) {
            return Err(StorageError::NoSuchUpload {
                upload_id: upload_id.to_owned(),
            });
        }
        debug!(upload_id = %upload_id, "cancel_upload completed");
        Ok(())
    }

    /// Drop upload sessions and rewrite operations older than the
    /// configured TTL.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> PurgeSummary {
        let ttl = i64::try_from(self.config.session_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        let summary = PurgeSummary {
            uploads: self.uploads.purge_older_than(now, ttl),
            rewrites: self.rewrites.purge_older_than(now, ttl),
        };
        debug!(
            uploads = summary.uploads,
            rewrites = summary.rewrites,
            "purge_expired completed"
        );
        summary
    }
}
