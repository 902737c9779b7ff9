//! Compose operation handler.

use bytes::BytesMut;
use tracing::debug;

use gcstack_storage_model::Object;
use gcstack_storage_model::input::ComposeObjectInput;

use crate::error::{StorageError, StorageResult};
use crate::ops::object::{PendingWrite, no_such_object};
use crate::precondition::check_value;
use crate::provider::GcStackStorage;

/// Maximum number of sources in one compose request.
pub const MAX_COMPOSE_SOURCES: usize = 32;

impl GcStackStorage {
    /// Concatenate up to 32 objects of one bucket into a new generation of
    /// the destination.
    ///
    /// The result carries a CRC32C but no MD5, and a component count equal
    /// to the sum of its sources' counts (a plain object counts as one).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty or oversized source list, `NotFound`
    /// for a missing source, `PreconditionFailed` if a source's
    /// `ifGenerationMatch` or a destination condition fails.
    pub fn compose_object(&self, input: ComposeObjectInput) -> StorageResult<Object> {
        if input.sources.is_empty() {
            return Err(StorageError::invalid("compose requires at least one source object"));
        }
        if input.sources.len() > MAX_COMPOSE_SOURCES {
            return Err(StorageError::invalid(format!(
                "compose accepts at most {MAX_COMPOSE_SOURCES} source objects, got {}",
                input.sources.len()
            )));
        }

        let (data, component_count) = {
            let bucket = self.state.get_bucket(&input.bucket)?;
            let objects = bucket.objects.read();
            bucket.ensure_live()?;
            let mut data = BytesMut::new();
            let mut component_count: u32 = 0;
            for source in &input.sources {
                let stored = objects
                    .resolve(&source.name, source.generation)
                    .ok_or_else(|| no_such_object(&input.bucket, &source.name, source.generation))?;
                check_value(
                    "ifGenerationMatch",
                    stored.resource.generation,
                    source.if_generation_match,
                    None,
                )?;
                data.extend_from_slice(&stored.data);
                component_count =
                    component_count.saturating_add(stored.resource.component_count.unwrap_or(1));
            }
            (data.freeze(), component_count)
        };

        let object = self.commit(PendingWrite {
            attributes: input.attributes,
            preconditions: input.preconditions,
            with_md5: false,
            component_count: Some(component_count),
            ..PendingWrite::new(input.bucket, input.destination, data)
        })?;
        debug!(
            bucket = %object.bucket,
            object = %object.name,
            generation = object.generation,
            component_count,
            "compose_object completed"
        );
        Ok(object)
    }
}
