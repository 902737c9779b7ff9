//! Resumable upload session state.
//!
//! Each [`UploadSession`] captures the target, draft metadata, preconditions
//! and declared checksums at start time and accumulates chunk bytes until
//! the declared total is reached. Sessions are individually locked; a chunk
//! holds its session's mutex from validation through commit.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::warn;

use gcstack_storage_model::{DeclaredChecksums, Object, ObjectAttributes, Preconditions};

/// An in-flight or completed resumable upload.
#[derive(Debug, Clone)]
pub struct UploadSession {
    /// Session id.
    pub upload_id: String,
    /// Target bucket.
    pub bucket: String,
    /// Target object name.
    pub name: String,
    /// Draft object attributes.
    pub attributes: ObjectAttributes,
    /// Conditions evaluated at finalization.
    pub preconditions: Preconditions,
    /// Checksums of the full content, validated at finalization.
    pub checksums: DeclaredChecksums,
    /// Predefined ACL, carried verbatim.
    pub predefined_acl: Option<String>,
    /// Bytes accepted so far.
    pub buffer: Vec<u8>,
    /// Transfer-encoding hints seen on accepted chunks.
    pub transfer_encodings: BTreeSet<String>,
    /// Start time.
    pub created: DateTime<Utc>,
    /// The finalized object, once complete.
    pub completed: Option<Object>,
}

impl UploadSession {
    /// Next expected byte offset.
    #[must_use]
    pub fn persisted_size(&self) -> u64 {
        self.buffer.len() as u64
    }

    /// Whether the session has been finalized.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed.is_some()
    }
}

/// Registry of upload sessions.
#[derive(Default)]
pub struct UploadSessions {
    sessions: DashMap<String, Arc<Mutex<UploadSession>>>,
}

impl std::fmt::Debug for UploadSessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSessions")
            .field("session_count", &self.sessions.len())
            .finish()
    }
}

impl UploadSessions {
    /// Register a session.
    pub fn insert(&self, session: UploadSession) {
        self.sessions
            .insert(session.upload_id.clone(), Arc::new(Mutex::new(session)));
    }

    /// Look up a session.
    #[must_use]
    pub fn get(&self, upload_id: &str) -> Option<Arc<Mutex<UploadSession>>> {
        self.sessions.get(upload_id).map(|s| Arc::clone(s.value()))
    }

    /// Remove a session, returning whether it existed.
    pub fn remove(&self, upload_id: &str) -> bool {
        self.sessions.remove(upload_id).is_some()
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions started more than `ttl` before `now`. Returns how many
    /// were dropped.
    ///
    /// A session whose mutex is held by an in-progress chunk is skipped.
    pub fn purge_older_than(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let Some(cutoff) = now.checked_sub_signed(ttl) else {
            return 0;
        };
        let before = self.sessions.len();
        self.sessions.retain(|id, session| match session.try_lock() {
            Some(s) if s.created < cutoff => {
                warn!(upload_id = %id, bucket = %s.bucket, object = %s.name, "purging abandoned upload session");
                false
            }
            _ => true,
        });
        before.saturating_sub(self.sessions.len())
    }

    /// Remove every session.
    pub fn clear(&self) {
        self.sessions.clear();
    }
}
