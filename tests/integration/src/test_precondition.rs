//! Generation, metageneration and etag precondition tests.

#[cfg(test)]
mod tests {
    use gcstack_storage_model::input::{
        DeleteObjectInput, GetObjectInput, InsertObjectInput, PatchObjectInput,
    };
    use gcstack_storage_model::{ObjectPatch, Preconditions, StorageErrorCode};

    use crate::{create_test_bucket, put, read, storage, test_bucket_name};

    fn get_with(
        storage: &gcstack_storage_core::GcStackStorage,
        bucket: &str,
        preconditions: Preconditions,
    ) -> Result<i64, StorageErrorCode> {
        storage
            .get_object(GetObjectInput {
                bucket: bucket.to_owned(),
                name: "f".to_owned(),
                generation: Some(0),
                preconditions,
            })
            .map(|o| o.generation)
            .map_err(|e| e.code())
    }

    #[test]
    fn test_should_match_generation_only_against_live() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("gm"), true);
        let g1 = put(&storage, &bucket, "f", "one").generation;
        let g2 = put(&storage, &bucket, "f", "two").generation;

        assert_eq!(get_with(&storage, &bucket, Preconditions::generation_match(g2)), Ok(g2));
        assert_eq!(
            get_with(&storage, &bucket, Preconditions::generation_match(g1)),
            Err(StorageErrorCode::PreconditionFailed)
        );
        assert_eq!(
            get_with(
                &storage,
                &bucket,
                Preconditions {
                    if_generation_not_match: Some(g2),
                    ..Preconditions::default()
                }
            ),
            Err(StorageErrorCode::PreconditionFailed)
        );
    }

    #[test]
    fn test_should_create_only_when_absent() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("dne"), false);
        let insert = |data: &'static str| {
            storage
                .insert_object(InsertObjectInput {
                    bucket: bucket.clone(),
                    name: "f".to_owned(),
                    data: data.into(),
                    preconditions: Preconditions::does_not_exist(),
                    ..InsertObjectInput::default()
                })
                .map_err(|e| e.code())
        };
        assert!(insert("first").is_ok());
        assert_eq!(insert("second").err(), Some(StorageErrorCode::PreconditionFailed));
        assert_eq!(read(&storage, &bucket, "f"), "first");
    }

    #[test]
    fn test_should_treat_absent_object_as_generation_zero() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("absent"), false);
        let err = storage
            .insert_object(InsertObjectInput {
                bucket: bucket.clone(),
                name: "f".to_owned(),
                data: "x".into(),
                preconditions: Preconditions::generation_match(5),
                ..InsertObjectInput::default()
            })
            .expect_err("no live object");
        assert_eq!(err.code(), StorageErrorCode::PreconditionFailed);

        let ok = storage.insert_object(InsertObjectInput {
            bucket,
            name: "f".to_owned(),
            data: "x".into(),
            preconditions: Preconditions {
                if_generation_not_match: Some(5),
                ..Preconditions::default()
            },
            ..InsertObjectInput::default()
        });
        assert!(ok.is_ok());
    }

    #[test]
    fn test_should_guard_patch_with_metageneration() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("mg"), false);
        put(&storage, &bucket, "f", "data");
        let patch = |mg: i64| {
            storage
                .patch_object(PatchObjectInput {
                    bucket: bucket.clone(),
                    name: "f".to_owned(),
                    patch: ObjectPatch {
                        content_type: Some("text/plain".to_owned()),
                        ..ObjectPatch::default()
                    },
                    preconditions: Preconditions {
                        if_metageneration_match: Some(mg),
                        ..Preconditions::default()
                    },
                    ..PatchObjectInput::default()
                })
                .map(|o| o.metageneration)
                .map_err(|e| e.code())
        };
        assert_eq!(patch(1), Ok(2));
        assert_eq!(patch(1), Err(StorageErrorCode::PreconditionFailed));
        assert_eq!(patch(2), Ok(3));
    }

    #[test]
    fn test_should_compare_etags() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("etag"), false);
        let object = put(&storage, &bucket, "f", "data");
        let quoted = format!("\"{}\"", object.etag);

        assert!(get_with(
            &storage,
            &bucket,
            Preconditions {
                if_etag_match: Some(quoted.clone()),
                ..Preconditions::default()
            }
        )
        .is_ok());
        assert_eq!(
            get_with(
                &storage,
                &bucket,
                Preconditions {
                    if_etag_not_match: Some(quoted),
                    ..Preconditions::default()
                }
            ),
            Err(StorageErrorCode::PreconditionFailed)
        );
    }

    #[test]
    fn test_should_leave_object_on_failed_delete_precondition() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("delpre"), false);
        let object = put(&storage, &bucket, "f", "keep");
        let err = storage
            .delete_object(DeleteObjectInput {
                bucket: bucket.clone(),
                name: "f".to_owned(),
                preconditions: Preconditions::generation_match(object.generation + 1),
                ..DeleteObjectInput::default()
            })
            .expect_err("stale generation");
        assert_eq!(err.code(), StorageErrorCode::PreconditionFailed);
        assert_eq!(read(&storage, &bucket, "f"), "keep");
    }
}
