//! Rewrite and copy scenario tests.

#[cfg(test)]
mod tests {
    use gcstack_storage_model::input::{CopyObjectInput, GetObjectInput, RewriteObjectInput};
    use gcstack_storage_model::{ObjectAttributes, SourcePreconditions, StorageErrorCode};

    use crate::{create_test_bucket, put, random_payload, read, storage, test_bucket_name};

    const OBJECT_SIZE: usize = 500 * 1024;
    const BUDGET: i64 = 256 * 1024;

    fn rewrite(source: &str, destination: &str, token: Option<String>) -> RewriteObjectInput {
        RewriteObjectInput {
            source_bucket: source.to_owned(),
            source_object: "src".to_owned(),
            destination_bucket: destination.to_owned(),
            destination_object: "dst".to_owned(),
            max_bytes_rewritten_per_call: Some(BUDGET),
            rewrite_token: token,
            ..RewriteObjectInput::default()
        }
    }

    #[test]
    fn test_should_rewrite_in_two_budgeted_calls() {
        let storage = storage();
        let source = create_test_bucket(&storage, &test_bucket_name("src"), false);
        let destination = create_test_bucket(&storage, &test_bucket_name("dst"), false);
        let data = random_payload(OBJECT_SIZE);
        let original = put(&storage, &source, "src", data.clone());

        let first = storage
            .rewrite_object(rewrite(&source, &destination, None))
            .expect("first call");
        assert!(!first.done);
        assert_eq!(first.object_size, 512_000);
        assert_eq!(first.total_bytes_rewritten, 256 * 1024);
        assert!(first.resource.is_none());

        let second = storage
            .rewrite_object(rewrite(&source, &destination, first.rewrite_token))
            .expect("second call");
        assert!(second.done);
        assert_eq!(second.object_size, 512_000);
        assert_eq!(second.total_bytes_rewritten, 512_000);
        assert!(second.total_bytes_rewritten > first.total_bytes_rewritten);

        let object = second.resource.expect("resource");
        assert_eq!(object.md5_hash, original.md5_hash);
        assert_eq!(read(&storage, &destination, "dst"), data);
    }

    #[test]
    fn test_should_pin_source_generation_across_calls() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("pin"), false);
        let data = random_payload(OBJECT_SIZE);
        put(&storage, &bucket, "src", data.clone());

        let first = storage
            .rewrite_object(rewrite(&bucket, &bucket, None))
            .expect("first call");
        put(&storage, &bucket, "src", "replaced mid-rewrite");
        let second = storage
            .rewrite_object(rewrite(&bucket, &bucket, first.rewrite_token))
            .expect("second call");
        assert!(second.done);
        assert_eq!(read(&storage, &bucket, "dst"), data);
    }

    #[test]
    fn test_should_reject_spent_and_mismatched_tokens() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("tokens"), false);
        put(&storage, &bucket, "src", random_payload(OBJECT_SIZE));

        let first = storage
            .rewrite_object(rewrite(&bucket, &bucket, None))
            .expect("first call");
        let token = first.rewrite_token.expect("token");

        let mut changed = rewrite(&bucket, &bucket, Some(token.clone()));
        changed.destination_object = "elsewhere".to_owned();
        let err = storage.rewrite_object(changed).expect_err("mismatch");
        assert_eq!(err.code(), StorageErrorCode::InvalidArgument);

        // A rejected continuation leaves the operation resumable.
        let done = storage
            .rewrite_object(rewrite(&bucket, &bucket, Some(token.clone())))
            .expect("resume");
        assert!(done.done);

        let err = storage
            .rewrite_object(rewrite(&bucket, &bucket, Some(token)))
            .expect_err("spent");
        assert_eq!(err.code(), StorageErrorCode::InvalidArgument);
    }

    #[test]
    fn test_should_check_source_preconditions_on_first_call() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("srcpre"), false);
        let source = put(&storage, &bucket, "src", "data");
        let err = storage
            .rewrite_object(RewriteObjectInput {
                source_preconditions: SourcePreconditions {
                    if_source_generation_match: Some(source.generation + 1),
                    ..SourcePreconditions::default()
                },
                ..rewrite(&bucket, &bucket, None)
            })
            .expect_err("source precondition");
        assert_eq!(err.code(), StorageErrorCode::PreconditionFailed);
        let err = storage
            .get_object(GetObjectInput {
                bucket,
                name: "dst".to_owned(),
                ..GetObjectInput::default()
            })
            .expect_err("nothing written");
        assert_eq!(err.code(), StorageErrorCode::NotFound);
    }

    #[test]
    fn test_should_copy_across_buckets_with_new_metadata() {
        let storage = storage();
        let source = create_test_bucket(&storage, &test_bucket_name("cpsrc"), false);
        let destination = create_test_bucket(&storage, &test_bucket_name("cpdst"), true);
        let data = random_payload(3 * 1024 * 1024);
        put(&storage, &source, "src", data.clone());

        let copied = storage
            .copy_object(CopyObjectInput {
                source_bucket: source.clone(),
                source_object: "src".to_owned(),
                destination_bucket: destination.clone(),
                destination_object: "copy".to_owned(),
                attributes: Some(ObjectAttributes {
                    content_type: Some("application/x-copied".to_owned()),
                    ..ObjectAttributes::default()
                }),
                ..CopyObjectInput::default()
            })
            .expect("copy");
        assert_eq!(copied.bucket, destination);
        assert_eq!(copied.content_type.as_deref(), Some("application/x-copied"));
        assert_eq!(copied.size, data.len() as u64);
        assert_eq!(read(&storage, &destination, "copy"), data);
    }

    #[test]
    fn test_should_cap_budget_at_configured_limit() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("cap"), false);
        put(&storage, &bucket, "src", random_payload(3 * 1024 * 1024));
        let limit = storage.config().rewrite_max_bytes_per_call;

        let first = storage
            .rewrite_object(RewriteObjectInput {
                max_bytes_rewritten_per_call: Some(i64::MAX),
                ..rewrite(&bucket, &bucket, None)
            })
            .expect("first call");
        assert!(!first.done);
        assert_eq!(first.total_bytes_rewritten, limit);
    }
}
