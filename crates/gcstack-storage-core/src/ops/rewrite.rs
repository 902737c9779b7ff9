//! Rewrite and copy handlers.
//!
//! A rewrite copies at most one budget of bytes per call. The first call
//! pins the source generation and checks the source preconditions; later
//! calls present the token returned by the previous one. Taking a parked
//! operation is a single `DashMap::remove`, so a token is spent by exactly
//! one caller.

use bytes::{Bytes, BytesMut};
use chrono::Utc;
use tracing::{debug, trace};

use gcstack_storage_model::input::{CopyObjectInput, RewriteObjectInput};
use gcstack_storage_model::output::RewriteObjectOutput;
use gcstack_storage_model::{Object, ObjectAttributes};

use crate::error::{StorageError, StorageResult};
use crate::ops::object::{PendingWrite, no_such_object};
use crate::precondition::{check_object, check_source};
use crate::provider::GcStackStorage;
use crate::state::{RewriteFingerprint, RewriteOperation, RewriteToken};
use crate::utils::generate_operation_id;
use crate::validation::validate_object_name;

fn fingerprint(input: &RewriteObjectInput) -> RewriteFingerprint {
    RewriteFingerprint {
        source_bucket: input.source_bucket.clone(),
        source_object: input.source_object.clone(),
        source_generation: input.source_generation.filter(|g| *g != 0),
        destination_bucket: input.destination_bucket.clone(),
        destination_object: input.destination_object.clone(),
        preconditions: input.preconditions.clone(),
        source_preconditions: input.source_preconditions,
        predefined_acl: input.destination_predefined_acl.clone(),
        kms_key_name: input.destination_kms_key_name.clone(),
        max_bytes_rewritten_per_call: input.max_bytes_rewritten_per_call,
    }
}

impl GcStackStorage {
    /// Run one call of a rewrite.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing source or bucket; `PreconditionFailed` for
    /// a failed source or destination condition; `InvalidArgument` for an
    /// unknown, spent or stale token, or for parameters that differ from the
    /// first call.
    pub fn rewrite_object(&self, input: RewriteObjectInput) -> StorageResult<RewriteObjectOutput> {
        let requested = input
            .max_bytes_rewritten_per_call
            .and_then(|n| u64::try_from(n).ok())
            .filter(|n| *n > 0);
        let limit = self.config.rewrite_max_bytes_per_call;
        let budget = requested.map_or(limit, |n| n.min(limit));
        self.rewrite_step(input, budget)
    }

    /// Copy an object in a single call.
    ///
    /// # Errors
    ///
    /// As [`GcStackStorage::rewrite_object`].
    pub fn copy_object(&self, input: CopyObjectInput) -> StorageResult<Object> {
        let output = self.rewrite_step(
            RewriteObjectInput {
                source_bucket: input.source_bucket,
                source_object: input.source_object,
                source_generation: input.source_generation,
                destination_bucket: input.destination_bucket,
                destination_object: input.destination_object,
                attributes: input.attributes,
                preconditions: input.preconditions,
                source_preconditions: input.source_preconditions,
                ..RewriteObjectInput::default()
            },
            u64::MAX,
        )?;
        output
            .resource
            .ok_or_else(|| anyhow::anyhow!("unbounded rewrite did not complete").into())
    }

    fn rewrite_step(&self, input: RewriteObjectInput, budget: u64) -> StorageResult<RewriteObjectOutput> {
        let fingerprint = fingerprint(&input);
        let mut op = match input.rewrite_token.as_deref() {
            Some(token) => self.resume_rewrite(token, &fingerprint)?,
            None => self.begin_rewrite(&input, fingerprint, budget)?,
        };

        let previous_len = op.buffer.len();
        let copied = op.advance();
        trace!(rewrite = %op.id, copied, total = op.bytes_rewritten(), "rewrite advanced");

        if !op.is_done() {
            let output = RewriteObjectOutput {
                done: false,
                total_bytes_rewritten: op.bytes_rewritten(),
                object_size: op.object_size(),
                rewrite_token: Some(op.token().encode()?),
                resource: None,
            };
            debug!(
                rewrite = %op.id,
                bytes_rewritten = output.total_bytes_rewritten,
                object_size = output.object_size,
                "rewrite_object in progress"
            );
            self.rewrites.store(op);
            return Ok(output);
        }

        let write = PendingWrite {
            attributes: op.attributes.clone(),
            preconditions: op.fingerprint.preconditions.clone(),
            ..PendingWrite::new(
                op.destination_bucket.clone(),
                op.destination_object.clone(),
                Bytes::copy_from_slice(&op.buffer),
            )
        };
        match self.commit(write) {
            Ok(object) => {
                debug!(
                    rewrite = %op.id,
                    source = %format_args!("{}/{}#{}", op.source_bucket, op.source_object, op.source_generation),
                    bucket = %object.bucket,
                    object = %object.name,
                    generation = object.generation,
                    "rewrite_object completed"
                );
                Ok(RewriteObjectOutput {
                    done: true,
                    total_bytes_rewritten: op.bytes_rewritten(),
                    object_size: op.object_size(),
                    rewrite_token: None,
                    resource: Some(object),
                })
            }
            Err(e) => {
                // Re-park only operations the caller already holds a token for.
                if input.rewrite_token.is_some() {
                    op.buffer.truncate(previous_len);
                    self.rewrites.store(op);
                }
                Err(e)
            }
        }
    }

    /// Pin the source and open a new operation.
    fn begin_rewrite(
        &self,
        input: &RewriteObjectInput,
        fingerprint: RewriteFingerprint,
        budget: u64,
    ) -> StorageResult<RewriteOperation> {
        validate_object_name(&input.destination_object)?;

        let source = {
            let bucket = self.state.get_bucket(&input.source_bucket)?;
            let objects = bucket.objects.read();
            bucket.ensure_live()?;
            let stored = objects
                .resolve(&input.source_object, input.source_generation)
                .ok_or_else(|| {
                    no_such_object(&input.source_bucket, &input.source_object, input.source_generation)
                })?;
            check_source(&input.source_preconditions, &stored.resource)?;
            stored.clone()
        };

        {
            let bucket = self.state.get_bucket(&input.destination_bucket)?;
            let objects = bucket.objects.read();
            bucket.ensure_live()?;
            check_object(
                &input.preconditions,
                objects.live(&input.destination_object).map(|o| &o.resource),
            )?;
        }

        let mut attributes = input
            .attributes
            .clone()
            .unwrap_or_else(|| ObjectAttributes::from_object(&source.resource));
        if let Some(key) = &input.destination_kms_key_name {
            attributes.kms_key_name = Some(key.clone());
        }
        if let Some(acl) = &input.destination_predefined_acl {
            trace!(predefined_acl = %acl, "predefined ACL left to the adaptor");
        }

        let op = RewriteOperation {
            id: generate_operation_id(),
            source_bucket: input.source_bucket.clone(),
            source_object: input.source_object.clone(),
            source_generation: source.resource.generation,
            destination_bucket: input.destination_bucket.clone(),
            destination_object: input.destination_object.clone(),
            fingerprint,
            budget,
            attributes,
            buffer: BytesMut::with_capacity(source.data.len()),
            source: source.data,
            created: Utc::now(),
        };
        debug!(
            rewrite = %op.id,
            source_generation = op.source_generation,
            budget,
            "rewrite started"
        );
        Ok(op)
    }

    /// Take the operation named by `token`, checking it against this call.
    fn resume_rewrite(
        &self,
        token: &str,
        fingerprint: &RewriteFingerprint,
    ) -> StorageResult<RewriteOperation> {
        let token = RewriteToken::decode(token)?;
        let op = self
            .rewrites
            .take(&token.id)
            .ok_or_else(|| StorageError::invalid("Unknown or already used rewrite token"))?;
        if op.bytes_rewritten() != token.bytes {
            self.rewrites.store(op);
            return Err(StorageError::invalid("Stale rewrite token"));
        }
        if &op.fingerprint != fingerprint {
            self.rewrites.store(op);
            return Err(StorageError::invalid(
                "Rewrite parameters differ from the call that issued the token",
            ));
        }
        Ok(op)
    }
}
