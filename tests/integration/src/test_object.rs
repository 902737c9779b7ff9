//! Object lifecycle integration tests.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use bytes::Bytes;
    use gcstack_storage_model::input::{
        ComposeObjectInput, ComposeSource, DeleteObjectInput, GetObjectInput, InsertObjectInput,
        ReadObjectInput, UpdateObjectInput,
    };
    use gcstack_storage_model::{DeclaredChecksums, ObjectAttributes, StorageErrorCode};

    use crate::{
        create_test_bucket, put, random_payload, read, sequential_storage, storage, test_bucket_name,
    };

    #[test]
    fn test_should_assign_strictly_increasing_generations() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("gens"), false);
        let mut last = 0;
        for i in 0..200 {
            let object = put(&storage, &bucket, "f", format!("v{i}"));
            assert!(object.generation > last, "{} <= {last}", object.generation);
            last = object.generation;
        }
        let mut other = 0;
        for name in ["a", "b", "c"] {
            let object = put(&storage, &bucket, name, "x");
            assert!(object.generation > last.max(other));
            other = object.generation;
        }
    }

    #[test]
    fn test_should_use_injected_sequential_generations() {
        let storage = sequential_storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("seq"), false);
        assert_eq!(put(&storage, &bucket, "a", "1").generation, 1);
        assert_eq!(put(&storage, &bucket, "b", "2").generation, 2);
        assert_eq!(put(&storage, &bucket, "a", "3").generation, 3);
    }

    #[test]
    fn test_should_round_trip_content_and_checksums() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("content"), false);
        let data = random_payload(64 * 1024);
        let declared = DeclaredChecksums {
            md5_hash: Some(gcstack_storage_core::checksums::compute_md5(&data)),
            crc32c: Some(gcstack_storage_core::checksums::compute_crc32c(&data)),
        };
        let object = storage
            .insert_object(InsertObjectInput {
                bucket: bucket.clone(),
                name: "blob".to_owned(),
                data: data.clone(),
                checksums: declared.clone(),
                attributes: ObjectAttributes {
                    content_type: Some("application/octet-stream".to_owned()),
                    metadata: BTreeMap::from([("k".to_owned(), "v".to_owned())]),
                    ..ObjectAttributes::default()
                },
                ..InsertObjectInput::default()
            })
            .expect("insert");
        assert_eq!(object.md5_hash, declared.md5_hash);
        assert_eq!(Some(object.crc32c.clone()), declared.crc32c);
        assert_eq!(object.size, 64 * 1024);
        assert_eq!(read(&storage, &bucket, "blob"), data);
    }

    #[test]
    fn test_should_reject_crc32c_mismatch() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("crc"), false);
        let err = storage
            .insert_object(InsertObjectInput {
                bucket: bucket.clone(),
                name: "f".to_owned(),
                data: Bytes::from_static(b"123456789"),
                checksums: DeclaredChecksums {
                    md5_hash: None,
                    crc32c: Some("AAAAAA==".to_owned()),
                },
                ..InsertObjectInput::default()
            })
            .expect_err("mismatch");
        assert_eq!(err.code(), StorageErrorCode::ChecksumMismatch);
        let err = storage
            .get_object(GetObjectInput {
                bucket,
                name: "f".to_owned(),
                ..GetObjectInput::default()
            })
            .expect_err("nothing stored");
        assert_eq!(err.code(), StorageErrorCode::NotFound);
    }

    #[test]
    fn test_should_make_live_reads_fail_after_deleting_live_generation() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("del"), true);
        let g1 = put(&storage, &bucket, "f", "one");
        let g2 = put(&storage, &bucket, "f", "two");

        storage
            .delete_object(DeleteObjectInput {
                bucket: bucket.clone(),
                name: "f".to_owned(),
                generation: Some(g1.generation),
                ..DeleteObjectInput::default()
            })
            .expect("delete noncurrent");
        assert_eq!(read(&storage, &bucket, "f"), Bytes::from_static(b"two"));

        storage
            .delete_object(DeleteObjectInput {
                bucket: bucket.clone(),
                name: "f".to_owned(),
                generation: Some(0),
                ..DeleteObjectInput::default()
            })
            .expect("delete live");
        for generation in [None, Some(0), Some(g2.generation)] {
            let err = storage
                .get_object(GetObjectInput {
                    bucket: bucket.clone(),
                    name: "f".to_owned(),
                    generation,
                    ..GetObjectInput::default()
                })
                .expect_err("deleted");
            assert_eq!(err.code(), StorageErrorCode::NotFound);
        }
    }

    #[test]
    fn test_should_update_metadata_without_touching_content() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("update"), false);
        let original = put(&storage, &bucket, "f", "payload");
        let updated = storage
            .update_object(UpdateObjectInput {
                bucket: bucket.clone(),
                name: "f".to_owned(),
                attributes: ObjectAttributes {
                    content_type: Some("text/plain".to_owned()),
                    ..ObjectAttributes::default()
                },
                ..UpdateObjectInput::default()
            })
            .expect("update");
        assert_eq!(updated.generation, original.generation);
        assert_eq!(updated.metageneration, 2);
        assert_eq!(updated.md5_hash, original.md5_hash);
        assert_ne!(updated.etag, original.etag);
        assert!(updated.updated >= original.updated);
        assert_eq!(read(&storage, &bucket, "f"), Bytes::from_static(b"payload"));
    }

    #[test]
    fn test_should_compose_pinned_generations() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("compose"), true);
        let old = put(&storage, &bucket, "part", "old-");
        put(&storage, &bucket, "part", "new-");
        put(&storage, &bucket, "tail", "end");
        let composed = storage
            .compose_object(ComposeObjectInput {
                bucket: bucket.clone(),
                destination: "whole".to_owned(),
                sources: vec![
                    ComposeSource {
                        name: "part".to_owned(),
                        generation: Some(old.generation),
                        if_generation_match: Some(old.generation),
                    },
                    ComposeSource::live("part"),
                    ComposeSource::live("tail"),
                ],
                ..ComposeObjectInput::default()
            })
            .expect("compose");
        assert_eq!(composed.component_count, Some(3));
        assert!(composed.md5_hash.is_none());
        assert_eq!(read(&storage, &bucket, "whole"), Bytes::from_static(b"old-new-end"));
    }

    #[test]
    fn test_should_serve_suffix_and_open_ranges() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("range"), false);
        put(&storage, &bucket, "f", "0123456789");
        let range = |spec: &str| {
            storage
                .read_object_media(ReadObjectInput {
                    bucket: bucket.clone(),
                    name: "f".to_owned(),
                    range: Some(spec.to_owned()),
                    ..ReadObjectInput::default()
                })
                .map(|out| out.data)
                .map_err(|e| e.code())
        };
        assert_eq!(range("bytes=-3"), Ok(Bytes::from_static(b"789")));
        assert_eq!(range("bytes=7-"), Ok(Bytes::from_static(b"789")));
        assert_eq!(range("bytes=0-0"), Ok(Bytes::from_static(b"0")));
        assert_eq!(range("bytes=20-30"), Err(StorageErrorCode::InvalidArgument));
    }
}
