//! Resumable upload scenario tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use gcstack_storage_core::GcStackStorage;
    use gcstack_storage_core::checksums::compute_md5;
    use gcstack_storage_model::input::{StartResumableUploadInput, UploadChunkInput};
    use gcstack_storage_model::output::UploadStatus;
    use gcstack_storage_model::{ContentRange, Preconditions, StorageErrorCode};

    use crate::{create_test_bucket, put, random_payload, read, storage, test_bucket_name};

    fn start(storage: &GcStackStorage, bucket: &str, name: &str) -> String {
        storage
            .start_resumable_upload(StartResumableUploadInput {
                bucket: bucket.to_owned(),
                name: name.to_owned(),
                ..StartResumableUploadInput::default()
            })
            .expect("start upload")
            .upload_id
    }

    fn chunk(upload_id: &str, first: u64, data: Bytes, total: Option<u64>) -> UploadChunkInput {
        let last = first + data.len() as u64 - 1;
        UploadChunkInput {
            upload_id: upload_id.to_owned(),
            range: Some(ContentRange::Chunk { first, last, total }),
            data,
            ..UploadChunkInput::default()
        }
    }

    /// Upload `data` in pieces of `step` bytes, declaring the total only on
    /// the final piece.
    fn upload_in_steps(
        storage: &GcStackStorage,
        bucket: &str,
        name: &str,
        data: &Bytes,
        step: usize,
    ) -> UploadStatus {
        let upload_id = start(storage, bucket, name);
        let mut offset = 0;
        loop {
            let end = (offset + step).min(data.len());
            let total = (end == data.len()).then_some(data.len() as u64);
            let status = storage
                .upload_chunk(chunk(&upload_id, offset as u64, data.slice(offset..end), total))
                .expect("upload chunk");
            if end == data.len() {
                return status;
            }
            assert_eq!(status, UploadStatus::Incomplete { persisted_size: end as u64 });
            offset = end;
        }
    }

    #[test]
    fn test_should_finalize_two_chunk_upload_as_new_generation() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, "bk1", false);
        let g1 = put(&storage, &bucket, "f", "AAAA").generation;

        let upload_id = storage
            .start_resumable_upload(StartResumableUploadInput {
                bucket: bucket.clone(),
                name: "f".to_owned(),
                preconditions: Preconditions::generation_match(g1),
                ..StartResumableUploadInput::default()
            })
            .expect("start upload")
            .upload_id;
        let first = storage
            .upload_chunk(chunk(&upload_id, 0, Bytes::from_static(b"BBBB"), None))
            .expect("first chunk");
        assert_eq!(first, UploadStatus::Incomplete { persisted_size: 4 });
        assert_eq!(first.range_header().as_deref(), Some("bytes=0-3"));

        let done = storage
            .upload_chunk(chunk(&upload_id, 4, Bytes::from_static(b"CCCC"), Some(8)))
            .expect("last chunk");
        let object = done.object().expect("complete").clone();
        assert!(object.generation > g1);
        assert_eq!(object.size, 8);
        assert_eq!(read(&storage, &bucket, "f"), "BBBBCCCC");
        assert_eq!(
            object.metadata.get("x_emulator_upload").map(String::as_str),
            Some("resumable")
        );

        // Re-querying a finished session is idempotent.
        let again = storage.query_upload_status(&upload_id).expect("query");
        assert_eq!(again, done);
    }

    #[test]
    fn test_should_match_single_shot_digest_for_any_chunking() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("digest"), false);
        let data = random_payload(100_000);
        let single = put(&storage, &bucket, "single", data.clone());

        for (i, step) in [1024, 4096, 33_333, 100_000].into_iter().enumerate() {
            let status = upload_in_steps(&storage, &bucket, &format!("chunked-{i}"), &data, step);
            let object = status.object().expect("complete");
            assert_eq!(object.md5_hash, single.md5_hash, "step {step}");
            assert_eq!(object.crc32c, single.crc32c, "step {step}");
        }
        assert_eq!(single.md5_hash, Some(compute_md5(&data)));
    }

    #[test]
    fn test_should_reject_out_of_order_chunk_without_losing_progress() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("order"), false);
        let upload_id = start(&storage, &bucket, "f");
        storage
            .upload_chunk(chunk(&upload_id, 0, Bytes::from_static(b"abcd"), None))
            .expect("first chunk");

        let err = storage
            .upload_chunk(chunk(&upload_id, 8, Bytes::from_static(b"ijkl"), Some(12)))
            .expect_err("gap");
        assert_eq!(err.code(), StorageErrorCode::InvalidArgument);

        let status = storage
            .upload_chunk(UploadChunkInput {
                upload_id: upload_id.clone(),
                range: Some(ContentRange::Query { total: None }),
                ..UploadChunkInput::default()
            })
            .expect("status query");
        assert_eq!(status, UploadStatus::Incomplete { persisted_size: 4 });
    }

    #[test]
    fn test_should_finalize_with_empty_total_query() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("empty"), false);
        let upload_id = start(&storage, &bucket, "f");
        storage
            .upload_chunk(chunk(&upload_id, 0, Bytes::from_static(b"xyz"), None))
            .expect("chunk");
        let status = storage
            .upload_chunk(UploadChunkInput {
                upload_id,
                range: Some(ContentRange::Query { total: Some(3) }),
                ..UploadChunkInput::default()
            })
            .expect("finalize");
        assert!(status.is_complete());
        assert_eq!(read(&storage, &bucket, "f"), "xyz");
    }

    #[test]
    fn test_should_fail_finalization_on_stale_precondition_and_allow_retry() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("race"), false);
        let upload_id = storage
            .start_resumable_upload(StartResumableUploadInput {
                bucket: bucket.clone(),
                name: "f".to_owned(),
                preconditions: Preconditions::does_not_exist(),
                ..StartResumableUploadInput::default()
            })
            .expect("start")
            .upload_id;
        storage
            .upload_chunk(chunk(&upload_id, 0, Bytes::from_static(b"late"), None))
            .expect("chunk");

        // Another writer creates the object while the upload is in flight.
        put(&storage, &bucket, "f", "early");
        let err = storage
            .upload_chunk(UploadChunkInput {
                upload_id: upload_id.clone(),
                range: Some(ContentRange::Query { total: Some(4) }),
                ..UploadChunkInput::default()
            })
            .expect_err("precondition");
        assert_eq!(err.code(), StorageErrorCode::PreconditionFailed);
        assert_eq!(read(&storage, &bucket, "f"), "early");
        assert_eq!(
            storage.query_upload_status(&upload_id).expect("query"),
            UploadStatus::Incomplete { persisted_size: 4 }
        );
    }

    #[test]
    fn test_should_forget_cancelled_session() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("cancel"), false);
        let upload_id = start(&storage, &bucket, "f");
        storage.cancel_upload(&upload_id).expect("cancel");
        let err = storage.query_upload_status(&upload_id).expect_err("gone");
        assert_eq!(err.code(), StorageErrorCode::NotFound);
        let err = storage.cancel_upload(&upload_id).expect_err("gone twice");
        assert_eq!(err.code(), StorageErrorCode::NotFound);
    }

    #[test]
    fn test_should_purge_abandoned_sessions() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("purge"), false);
        let upload_id = start(&storage, &bucket, "f");
        let later = chrono::Utc::now() + chrono::Duration::days(2);
        let summary = storage.purge_expired(later);
        assert_eq!(summary.uploads, 1);
        assert!(storage.query_upload_status(&upload_id).is_err());
    }
}
