//! Transport-neutral request abstraction.
//!
//! Adaptors decode their wire format into a [`StorageRequest`] and read the
//! parameters the core needs through normalized accessors. REST requests
//! carry string query parameters and headers, so every numeric accessor
//! returns a [`Result`]; RPC requests already carry typed fields.
//!
//! For REST, a query parameter wins over the equivalent `x-goog-*` header.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::HeaderMap;

use crate::error::RequestError;
use crate::input::{InsertObjectInput, RewriteObjectInput, UploadChunkInput};
use crate::types::{
    ContentRange, DeclaredChecksums, ObjectAttributes, Preconditions, SourcePreconditions,
};

/// A REST-shaped request (JSON or XML API).
#[derive(Debug, Clone, Default)]
pub struct RestRequest {
    /// HTTP method.
    pub method: http::Method,
    /// Request path.
    pub path: String,
    /// Decoded query parameters.
    pub query: BTreeMap<String, String>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl RestRequest {
    /// Create a request with no parameters.
    #[must_use]
    pub fn new(method: http::Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Self::default()
        }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    fn header(&self, name: &str) -> Result<Option<&str>, RequestError> {
        self.headers
            .get(name)
            .map(|v| {
                v.to_str().map_err(|_| RequestError::InvalidParameter {
                    name: name.to_owned(),
                    value: String::from_utf8_lossy(v.as_bytes()).into_owned(),
                })
            })
            .transpose()
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Query parameter `param`, else header `header`, parsed as `i64`.
    fn int_param(&self, param: &str, header: Option<&str>) -> Result<Option<i64>, RequestError> {
        if let Some(v) = self.param(param) {
            return parse_i64(param, v).map(Some);
        }
        match header {
            Some(h) => self.header(h)?.map(|v| parse_i64(h, v)).transpose(),
            None => Ok(None),
        }
    }
}

/// An RPC-shaped request with typed fields.
#[derive(Debug, Clone, Default)]
pub struct RpcRequest {
    /// `if_generation_match`.
    pub if_generation_match: Option<i64>,
    /// `if_generation_not_match`.
    pub if_generation_not_match: Option<i64>,
    /// `if_metageneration_match`.
    pub if_metageneration_match: Option<i64>,
    /// `if_metageneration_not_match`.
    pub if_metageneration_not_match: Option<i64>,
    /// `if_source_generation_match`.
    pub if_source_generation_match: Option<i64>,
    /// `if_source_generation_not_match`.
    pub if_source_generation_not_match: Option<i64>,
    /// `if_source_metageneration_match`.
    pub if_source_metageneration_match: Option<i64>,
    /// `if_source_metageneration_not_match`.
    pub if_source_metageneration_not_match: Option<i64>,
    /// Target generation.
    pub generation: Option<i64>,
    /// Source generation for copy and rewrite.
    pub source_generation: Option<i64>,
    /// `rewrite_token`.
    pub rewrite_token: Option<String>,
    /// `max_bytes_rewritten_per_call`.
    pub max_bytes_rewritten_per_call: Option<i64>,
    /// `predefined_acl`.
    pub predefined_acl: Option<String>,
    /// `destination_predefined_acl`.
    pub destination_predefined_acl: Option<String>,
    /// `destination_kms_key`.
    pub destination_kms_key_name: Option<String>,
    /// Raw MD5 digest of the full object.
    pub md5_hash: Option<Bytes>,
    /// CRC32C of the full object.
    pub crc32c: Option<u32>,
    /// `upload_id` of a resumable write.
    pub upload_id: Option<String>,
    /// Offset of `content` within the object.
    pub write_offset: Option<i64>,
    /// Whether this message completes the write.
    pub finish_write: bool,
    /// Object attributes from the write spec.
    pub attributes: ObjectAttributes,
    /// Message payload.
    pub content: Bytes,
}

/// A request from either transport.
#[derive(Debug, Clone)]
pub enum StorageRequest {
    /// JSON / XML API.
    Rest(RestRequest),
    /// gRPC API.
    Rpc(RpcRequest),
}

impl StorageRequest {
    /// Target-object preconditions.
    pub fn preconditions(&self) -> Result<Preconditions, RequestError> {
        match self {
            Self::Rest(r) => Ok(Preconditions {
                if_generation_match: r
                    .int_param("ifGenerationMatch", Some("x-goog-if-generation-match"))?,
                if_generation_not_match: r.int_param("ifGenerationNotMatch", None)?,
                if_metageneration_match: r.int_param(
                    "ifMetagenerationMatch",
                    Some("x-goog-if-metageneration-match"),
                )?,
                if_metageneration_not_match: r.int_param("ifMetagenerationNotMatch", None)?,
                if_etag_match: r.header("if-match")?.map(str::to_owned),
                if_etag_not_match: r.header("if-none-match")?.map(str::to_owned),
            }),
            Self::Rpc(r) => Ok(Preconditions {
                if_generation_match: r.if_generation_match,
                if_generation_not_match: r.if_generation_not_match,
                if_metageneration_match: r.if_metageneration_match,
                if_metageneration_not_match: r.if_metageneration_not_match,
                if_etag_match: None,
                if_etag_not_match: None,
            }),
        }
    }

    /// Source-object preconditions of a copy or rewrite.
    pub fn source_preconditions(&self) -> Result<SourcePreconditions, RequestError> {
        match self {
            Self::Rest(r) => Ok(SourcePreconditions {
                if_source_generation_match: r.int_param(
                    "ifSourceGenerationMatch",
                    Some("x-goog-copy-source-if-generation-match"),
                )?,
                if_source_generation_not_match: r.int_param("ifSourceGenerationNotMatch", None)?,
                if_source_metageneration_match: r.int_param(
                    "ifSourceMetagenerationMatch",
                    Some("x-goog-copy-source-if-metageneration-match"),
                )?,
                if_source_metageneration_not_match: r
                    .int_param("ifSourceMetagenerationNotMatch", None)?,
            }),
            Self::Rpc(r) => Ok(SourcePreconditions {
                if_source_generation_match: r.if_source_generation_match,
                if_source_generation_not_match: r.if_source_generation_not_match,
                if_source_metageneration_match: r.if_source_metageneration_match,
                if_source_metageneration_not_match: r.if_source_metageneration_not_match,
            }),
        }
    }

    /// Explicit target generation.
    pub fn generation(&self) -> Result<Option<i64>, RequestError> {
        match self {
            Self::Rest(r) => r.int_param("generation", Some("x-goog-generation")),
            Self::Rpc(r) => Ok(r.generation),
        }
    }

    /// Explicit source generation of a copy or rewrite.
    pub fn source_generation(&self) -> Result<Option<i64>, RequestError> {
        match self {
            Self::Rest(r) => r.int_param("sourceGeneration", None),
            Self::Rpc(r) => Ok(r.source_generation),
        }
    }

    /// Rewrite continuation token.
    #[must_use]
    pub fn rewrite_token(&self) -> Option<&str> {
        match self {
            Self::Rest(r) => r.param("rewriteToken"),
            Self::Rpc(r) => r.rewrite_token.as_deref(),
        }
    }

    /// Requested rewrite byte budget.
    pub fn max_bytes_rewritten_per_call(&self) -> Result<Option<i64>, RequestError> {
        match self {
            Self::Rest(r) => r.int_param("maxBytesRewrittenPerCall", None),
            Self::Rpc(r) => Ok(r.max_bytes_rewritten_per_call),
        }
    }

    /// Predefined ACL for an insert.
    pub fn predefined_acl(&self) -> Result<Option<String>, RequestError> {
        match self {
            Self::Rest(r) => match r.param("predefinedAcl") {
                Some(v) => Ok(Some(v.to_owned())),
                None => Ok(r.header("x-goog-acl")?.map(str::to_owned)),
            },
            Self::Rpc(r) => Ok(r.predefined_acl.clone()),
        }
    }

    /// Predefined ACL for a rewrite destination.
    #[must_use]
    pub fn destination_predefined_acl(&self) -> Option<String> {
        match self {
            Self::Rest(r) => r.param("destinationPredefinedAcl").map(str::to_owned),
            Self::Rpc(r) => r.destination_predefined_acl.clone(),
        }
    }

    /// KMS key for a rewrite destination.
    #[must_use]
    pub fn destination_kms_key_name(&self) -> Option<String> {
        match self {
            Self::Rest(r) => r.param("destinationKmsKeyName").map(str::to_owned),
            Self::Rpc(r) => r.destination_kms_key_name.clone(),
        }
    }

    /// Checksums declared through `x-goog-hash` or the RPC checksum fields.
    pub fn declared_checksums(&self) -> Result<DeclaredChecksums, RequestError> {
        match self {
            Self::Rest(r) => {
                let mut declared = DeclaredChecksums::default();
                for value in r.headers.get_all("x-goog-hash") {
                    let value = value
                        .to_str()
                        .map_err(|_| RequestError::MalformedHash(format!("{value:?}")))?;
                    let parsed = DeclaredChecksums::parse_goog_hash(value)?;
                    declared.md5_hash = parsed.md5_hash.or(declared.md5_hash);
                    declared.crc32c = parsed.crc32c.or(declared.crc32c);
                }
                Ok(declared)
            }
            Self::Rpc(r) => Ok(DeclaredChecksums::from_raw(r.md5_hash.as_deref(), r.crc32c)),
        }
    }

    /// Resumable-upload range.
    ///
    /// RPC writes have no `Content-Range`; one is synthesized from
    /// `write_offset`, the payload length and `finish_write`.
    pub fn content_range(&self) -> Result<Option<ContentRange>, RequestError> {
        match self {
            Self::Rest(r) => r
                .header("content-range")?
                .map(str::parse::<ContentRange>)
                .transpose(),
            Self::Rpc(r) => {
                let offset = match r.write_offset {
                    Some(o) => u64::try_from(o).map_err(|_| RequestError::InvalidParameter {
                        name: "write_offset".to_owned(),
                        value: o.to_string(),
                    })?,
                    None => 0,
                };
                let len = r.content.len() as u64;
                let end = offset.checked_add(len).ok_or_else(|| RequestError::InvalidParameter {
                    name: "write_offset".to_owned(),
                    value: offset.to_string(),
                })?;
                let total = r.finish_write.then_some(end);
                if len == 0 {
                    return Ok(Some(ContentRange::Query { total }));
                }
                Ok(Some(ContentRange::Chunk {
                    first: offset,
                    last: end - 1,
                    total,
                }))
            }
        }
    }

    /// Resumable upload session id.
    #[must_use]
    pub fn upload_id(&self) -> Option<&str> {
        match self {
            Self::Rest(r) => r.param("upload_id"),
            Self::Rpc(r) => r.upload_id.as_deref(),
        }
    }

    /// Request payload.
    #[must_use]
    pub fn payload(&self) -> Bytes {
        match self {
            Self::Rest(r) => r.body.clone(),
            Self::Rpc(r) => r.content.clone(),
        }
    }

    /// Build an insert input for `bucket`/`name` from this request.
    pub fn insert_input(
        &self,
        bucket: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<InsertObjectInput, RequestError> {
        let attributes = match self {
            Self::Rest(r) => ObjectAttributes {
                content_type: r.header("content-type")?.map(str::to_owned),
                content_encoding: r.header("content-encoding")?.map(str::to_owned),
                ..ObjectAttributes::default()
            },
            Self::Rpc(r) => r.attributes.clone(),
        };
        Ok(InsertObjectInput {
            bucket: bucket.into(),
            name: name.into(),
            data: self.payload(),
            attributes,
            checksums: self.declared_checksums()?,
            preconditions: self.preconditions()?,
            predefined_acl: self.predefined_acl()?,
        })
    }

    /// Build a chunk input for the session named by this request.
    pub fn upload_chunk_input(&self) -> Result<UploadChunkInput, RequestError> {
        let upload_id = self
            .upload_id()
            .ok_or_else(|| RequestError::InvalidParameter {
                name: "upload_id".to_owned(),
                value: String::new(),
            })?
            .to_owned();
        let (finalize, transfer_encoding) = match self {
            Self::Rest(r) => {
                let encoding = match r.header("transfer-encoding")? {
                    Some(v) => Some(v.to_owned()),
                    None => r.header("content-encoding")?.map(str::to_owned),
                };
                (false, encoding)
            }
            Self::Rpc(r) => (r.finish_write, None),
        };
        Ok(UploadChunkInput {
            upload_id,
            range: self.content_range()?,
            data: self.payload(),
            finalize,
            transfer_encoding,
        })
    }

    /// Build a rewrite input between the given source and destination.
    ///
    /// The four names are taken from the caller (the path) rather than the
    /// request so a continuation can be checked against them.
    pub fn rewrite_input(
        &self,
        source_bucket: impl Into<String>,
        source_object: impl Into<String>,
        destination_bucket: impl Into<String>,
        destination_object: impl Into<String>,
    ) -> Result<RewriteObjectInput, RequestError> {
        Ok(RewriteObjectInput {
            source_bucket: source_bucket.into(),
            source_object: source_object.into(),
            source_generation: self.source_generation()?,
            destination_bucket: destination_bucket.into(),
            destination_object: destination_object.into(),
            attributes: None,
            preconditions: self.preconditions()?,
            source_preconditions: self.source_preconditions()?,
            destination_predefined_acl: self.destination_predefined_acl(),
            destination_kms_key_name: self.destination_kms_key_name(),
            max_bytes_rewritten_per_call: self.max_bytes_rewritten_per_call()?,
            rewrite_token: self.rewrite_token().map(str::to_owned),
        })
    }
}

fn parse_i64(name: &str, value: &str) -> Result<i64, RequestError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| RequestError::InvalidParameter {
            name: name.to_owned(),
            value: value.to_owned(),
        })
}
