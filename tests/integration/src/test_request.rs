//! Requests from both transports normalized into core operations.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use gcstack_storage_core::checksums::compute_md5;
    use gcstack_storage_core::StorageError;
    use gcstack_storage_model::input::StartResumableUploadInput;
    use gcstack_storage_model::{RestRequest, RpcRequest, StorageErrorCode, StorageRequest};
    use http::{HeaderName, HeaderValue, Method};

    use crate::{create_test_bucket, put, read, storage, test_bucket_name};

    const CHECK_PAYLOAD: &[u8] = b"123456789";
    const CHECK_CRC32C: u32 = 0xE306_9283;

    #[test]
    fn test_should_insert_through_rest_with_declared_hashes() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("resthash"), false);
        let header = format!("crc32c=4waSgw==,md5={}", compute_md5(CHECK_PAYLOAD));
        let request = StorageRequest::Rest(
            RestRequest::new(Method::POST, format!("/upload/storage/v1/b/{bucket}/o"))
                .with_query("ifGenerationMatch", "0")
                .with_header(
                    HeaderName::from_static("x-goog-hash"),
                    HeaderValue::from_str(&header).expect("header value"),
                )
                .with_header(
                    HeaderName::from_static("content-type"),
                    HeaderValue::from_static("text/plain"),
                )
                .with_body(Bytes::from_static(CHECK_PAYLOAD)),
        );
        let input = request.insert_input(&bucket, "f").expect("normalize");
        let object = storage.insert_object(input).expect("insert");
        assert_eq!(object.content_type.as_deref(), Some("text/plain"));
        assert_eq!(object.crc32c, "4waSgw==");

        // The same request again fails its ifGenerationMatch=0 guard.
        let input = request.insert_input(&bucket, "f").expect("normalize");
        let err = storage.insert_object(input).expect_err("exists");
        assert_eq!(err.code(), StorageErrorCode::PreconditionFailed);
    }

    #[test]
    fn test_should_insert_through_rpc_with_raw_checksums() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("rpchash"), false);
        let good = StorageRequest::Rpc(RpcRequest {
            crc32c: Some(CHECK_CRC32C),
            content: Bytes::from_static(CHECK_PAYLOAD),
            ..RpcRequest::default()
        });
        let object = storage
            .insert_object(good.insert_input(&bucket, "f").expect("normalize"))
            .expect("insert");
        assert_eq!(object.crc32c, "4waSgw==");

        let bad = StorageRequest::Rpc(RpcRequest {
            crc32c: Some(CHECK_CRC32C ^ 1),
            content: Bytes::from_static(CHECK_PAYLOAD),
            ..RpcRequest::default()
        });
        let err = storage
            .insert_object(bad.insert_input(&bucket, "g").expect("normalize"))
            .expect_err("mismatch");
        assert_eq!(err.code(), StorageErrorCode::ChecksumMismatch);
    }

    #[test]
    fn test_should_upload_through_rpc_write_offsets() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("rpcup"), false);
        let upload_id = storage
            .start_resumable_upload(StartResumableUploadInput {
                bucket: bucket.clone(),
                name: "f".to_owned(),
                ..StartResumableUploadInput::default()
            })
            .expect("start")
            .upload_id;
        let write = |offset: i64, content: &'static [u8], finish_write: bool| {
            StorageRequest::Rpc(RpcRequest {
                upload_id: Some(upload_id.clone()),
                write_offset: Some(offset),
                content: Bytes::from_static(content),
                finish_write,
                ..RpcRequest::default()
            })
            .upload_chunk_input()
            .expect("normalize")
        };

        let status = storage.upload_chunk(write(0, b"BBBB", false)).expect("first");
        assert!(!status.is_complete());
        let status = storage.upload_chunk(write(4, b"CCCC", true)).expect("last");
        assert_eq!(status.object().map(|o| o.size), Some(8));
        assert_eq!(read(&storage, &bucket, "f"), "BBBBCCCC");
    }

    #[test]
    fn test_should_upload_through_rest_content_ranges() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("restup"), false);
        let upload_id = storage
            .start_resumable_upload(StartResumableUploadInput {
                bucket: bucket.clone(),
                name: "f".to_owned(),
                ..StartResumableUploadInput::default()
            })
            .expect("start")
            .upload_id;
        let chunk = |range: &'static str, body: &'static [u8]| {
            StorageRequest::Rest(
                RestRequest::new(Method::PUT, format!("/upload/storage/v1/b/{bucket}/o"))
                    .with_query("upload_id", upload_id.clone())
                    .with_header(
                        HeaderName::from_static("content-range"),
                        HeaderValue::from_static(range),
                    )
                    .with_body(Bytes::from_static(body)),
            )
            .upload_chunk_input()
            .expect("normalize")
        };

        storage.upload_chunk(chunk("bytes 0-2/*", b"abc")).expect("first");
        let status = storage.upload_chunk(chunk("bytes */*", b"")).expect("query");
        assert_eq!(status.range_header().as_deref(), Some("bytes=0-2"));
        let status = storage.upload_chunk(chunk("bytes 3-5/6", b"def")).expect("last");
        assert!(status.is_complete());
        assert_eq!(read(&storage, &bucket, "f"), "abcdef");
    }

    #[test]
    fn test_should_resume_rewrite_from_rest_token() {
        let storage = storage();
        let bucket = create_test_bucket(&storage, &test_bucket_name("restrw"), false);
        put(&storage, &bucket, "src", vec![9u8; 3000]);
        let call = |token: Option<&str>| {
            let mut rest = RestRequest::new(Method::POST, "/rewriteTo")
                .with_query("maxBytesRewrittenPerCall", "1024");
            if let Some(token) = token {
                rest = rest.with_query("rewriteToken", token);
            }
            StorageRequest::Rest(rest)
                .rewrite_input(&bucket, "src", &bucket, "dst")
                .map_err(StorageError::from)
                .and_then(|input| storage.rewrite_object(input))
        };

        let mut output = call(None).expect("first call");
        let mut calls = 1;
        while !output.done {
            let token = output.rewrite_token.clone().expect("token while not done");
            output = call(Some(&token)).expect("continuation");
            calls += 1;
        }
        assert_eq!(calls, 3);
        assert_eq!(read(&storage, &bucket, "dst").len(), 3000);
    }

    #[test]
    fn test_should_reject_malformed_parameters_as_invalid_argument() {
        let request = StorageRequest::Rest(
            RestRequest::new(Method::GET, "/storage/v1/b/bk1/o/f").with_query("ifGenerationMatch", "soon"),
        );
        let err: StorageError = request.preconditions().expect_err("not a number").into();
        assert_eq!(err.code(), StorageErrorCode::InvalidArgument);
    }
}
