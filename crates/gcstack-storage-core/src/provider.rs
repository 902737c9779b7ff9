//! The storage provider.
//!
//! [`GcStackStorage`] owns all state (buckets, objects, upload sessions,
//! rewrite operations) and the generation source. The operations themselves
//! are implemented in the [`crate::ops`] submodules as inherent methods.
//! There is no process-wide instance; the embedding server owns one and
//! passes it by reference (or `Arc`) to its handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::clock::{GenerationSource, MonotonicClock};
use crate::config::StorageConfig;
use crate::state::{RewriteOperations, StorageState, UploadSessions};

/// In-memory object storage provider.
///
/// # Examples
///
/// ```
/// use gcstack_storage_core::GcStackStorage;
/// use gcstack_storage_core::config::StorageConfig;
///
/// let storage = GcStackStorage::new(StorageConfig::default());
/// assert_eq!(storage.config().project_id, "test-project");
/// ```
#[derive(Debug)]
pub struct GcStackStorage {
    /// Buckets and objects.
    pub(crate) state: Arc<StorageState>,
    /// Resumable upload sessions.
    pub(crate) uploads: Arc<UploadSessions>,
    /// Parked rewrite operations.
    pub(crate) rewrites: Arc<RewriteOperations>,
    /// Source of new object generations.
    pub(crate) clock: Arc<dyn GenerationSource>,
    /// Provider configuration.
    pub(crate) config: Arc<StorageConfig>,
    /// Sequence feeding upload id derivation.
    upload_sequence: AtomicU64,
}

impl GcStackStorage {
    /// Create a provider backed by a [`MonotonicClock`].
    #[must_use]
    pub fn new(config: StorageConfig) -> Self {
        Self::with_generation_source(config, Arc::new(MonotonicClock::new()))
    }

    /// Create a provider with an explicit generation source.
    #[must_use]
    pub fn with_generation_source(config: StorageConfig, clock: Arc<dyn GenerationSource>) -> Self {
        Self {
            state: Arc::new(StorageState::new()),
            uploads: Arc::new(UploadSessions::default()),
            rewrites: Arc::new(RewriteOperations::default()),
            clock,
            config: Arc::new(config),
            upload_sequence: AtomicU64::new(0),
        }
    }

    /// Returns a reference to the bucket and object state.
    #[must_use]
    pub fn state(&self) -> &StorageState {
        &self.state
    }

    /// Returns a reference to the provider configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Next value of the upload id sequence.
    pub(crate) fn next_upload_sequence(&self) -> u64 {
        self.upload_sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Drop every bucket, object, upload session and rewrite operation.
    pub fn reset(&self) {
        info!("resetting storage provider");
        self.state.reset();
        self.uploads.clear();
        self.rewrites.clear();
    }
}
