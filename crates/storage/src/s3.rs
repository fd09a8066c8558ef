//! S3-compatible backend built on `aws-sdk-s3`.
//!
//! Works against AWS S3 and self-hosted services such as MinIO (set an endpoint and path-style
//! addressing). Uploads are streamed: bodies up to one part are sent with a single
//! `PutObject`, larger ones switch to a multipart upload that is aborted if anything fails.

use crate::constants::{DEFAULT_PART_SIZE, DELETE_BATCH_SIZE, MIN_PART_SIZE};
use crate::object::not_found_or;
use crate::{
    DeleteFailure, ListStream, ListedItem, ObjectBody, ObjectStore, StorageError, StorageResult,
    StoreOp,
};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CompletedMultipartUpload, CompletedPart, CreateBucketConfiguration,
    Delete, ObjectIdentifier,
};
use aws_sdk_s3::Client;
use bytes::BytesMut;
use futures::{StreamExt, TryStreamExt};

/// Region S3 treats as the default; buckets there take no location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// S3 backend configuration options
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket holding every tenant's objects
    pub bucket: String,
    /// Region (the SDK default chain is used when unset)
    pub region: Option<String>,
    /// Custom endpoint URL (e.g. for MinIO or localstack)
    pub endpoint: Option<String>,
    /// Static access key; the default credential chain is used when unset
    pub access_key: Option<String>,
    /// Static secret key, paired with `access_key`
    pub secret_key: Option<String>,
    /// Force path-style access (required for most self-hosted services)
    pub force_path_style: bool,
    /// Part size for multipart uploads in bytes (default: 8MB)
    pub part_size: usize,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: None,
            endpoint: None,
            access_key: None,
            secret_key: None,
            force_path_style: true,
            part_size: DEFAULT_PART_SIZE,
        }
    }
}

impl S3Config {
    /// Bucket used when none is configured.
    pub const DEFAULT_BUCKET: &'static str = "user-files";

    /// Builds a configuration from `STOWAGE_S3_*` variables.
    ///
    /// `lookup` returns the raw value of a variable; binaries pass `std::env::var(..).ok()`.
    /// Blank values count as unset. The region defaults to `us-east-1` and path-style
    /// addressing defaults to on.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> StorageResult<Self> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let force_path_style = match get("STOWAGE_S3_FORCE_PATH_STYLE") {
            None => true,
            Some(v) => v.parse::<bool>().map_err(|_| {
                StorageError::InvalidConfig(format!(
                    "STOWAGE_S3_FORCE_PATH_STYLE must be true or false, got '{}'",
                    v
                ))
            })?,
        };

        Ok(Self {
            bucket: get("STOWAGE_S3_BUCKET").unwrap_or_else(|| Self::DEFAULT_BUCKET.into()),
            region: Some(get("STOWAGE_S3_REGION").unwrap_or_else(|| DEFAULT_REGION.into())),
            endpoint: get("STOWAGE_S3_ENDPOINT"),
            access_key: get("STOWAGE_S3_ACCESS_KEY"),
            secret_key: get("STOWAGE_S3_SECRET_KEY"),
            force_path_style,
            part_size: DEFAULT_PART_SIZE,
        })
    }
}

/// Object store backed by an S3 bucket.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: Option<String>,
    part_size: usize,
}

impl S3ObjectStore {
    /// Builds a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if the bucket name is blank, only one half of
    /// the static credentials is set, or the part size is below the S3 minimum.
    pub async fn connect(config: S3Config) -> StorageResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::InvalidConfig(
                "bucket name cannot be empty".into(),
            ));
        }
        if config.part_size < MIN_PART_SIZE {
            return Err(StorageError::InvalidConfig(format!(
                "part size must be at least {} bytes",
                MIN_PART_SIZE
            )));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                loader = loader.credentials_provider(Credentials::new(
                    access_key.clone(),
                    secret_key.clone(),
                    None,
                    None,
                    "stowage-static",
                ));
            }
            (None, None) => {}
            _ => {
                return Err(StorageError::InvalidConfig(
                    "access key and secret key must be set together".into(),
                ))
            }
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        builder = builder.force_path_style(config.force_path_style);

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket,
            region: config.region,
            part_size: config.part_size,
        })
    }

    /// Sends one `PutObject` with an already-buffered body.
    async fn put_single(&self, key: &str, data: bytes::Bytes) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::operation(StoreOp::Put, key, e))?;
        Ok(())
    }

    /// Streams the remainder of `body` as a multipart upload whose first bytes are already in
    /// `buffer`.
    async fn put_multipart(
        &self,
        key: &str,
        body: ObjectBody,
        buffer: BytesMut,
        exhausted: bool,
    ) -> StorageResult<u64> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::operation(StoreOp::Put, key, e))?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| {
                StorageError::operation(
                    StoreOp::Put,
                    key,
                    "missing upload_id in create_multipart_upload response",
                )
            })?
            .to_owned();

        match self
            .upload_parts(key, &upload_id, body, buffer, exhausted)
            .await
        {
            Ok((parts, written)) => {
                self.client
                    .complete_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .multipart_upload(
                        CompletedMultipartUpload::builder()
                            .set_parts(Some(parts))
                            .build(),
                    )
                    .send()
                    .await
                    .map_err(|e| StorageError::operation(StoreOp::Put, key, e))?;
                Ok(written)
            }
            Err(err) => {
                if let Err(abort) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    tracing::warn!("failed to abort multipart upload for {}: {}", key, abort);
                }
                Err(err)
            }
        }
    }

    async fn upload_parts(
        &self,
        key: &str,
        upload_id: &str,
        mut body: ObjectBody,
        mut buffer: BytesMut,
        mut exhausted: bool,
    ) -> StorageResult<(Vec<CompletedPart>, u64)> {
        let mut parts = Vec::new();
        let mut written = 0u64;
        let mut part_number = 1i32;

        loop {
            if !exhausted {
                exhausted = !fill_part(&mut body, &mut buffer, self.part_size).await?;
            }
            if buffer.is_empty() {
                break;
            }

            let take = buffer.len().min(self.part_size);
            let chunk = buffer.split_to(take).freeze();
            let len = chunk.len() as u64;

            let uploaded = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(chunk))
                .send()
                .await
                .map_err(|e| StorageError::operation(StoreOp::Put, key, e))?;

            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .set_e_tag(uploaded.e_tag().map(str::to_owned))
                    .build(),
            );
            written += len;
            part_number += 1;
        }

        Ok((parts, written))
    }
}

/// Pulls chunks from `body` until `buffer` holds at least `part_size` bytes.
///
/// Returns `false` once the body is exhausted.
async fn fill_part(
    body: &mut ObjectBody,
    buffer: &mut BytesMut,
    part_size: usize,
) -> StorageResult<bool> {
    while buffer.len() < part_size {
        match body.try_next().await? {
            Some(chunk) => buffer.extend_from_slice(&chunk),
            None => return Ok(false),
        }
    }
    Ok(true)
}

/// Percent-encodes a key for the `x-amz-copy-source` header, keeping `/` separators.
fn encode_copy_source(bucket: &str, key: &str) -> String {
    let encoded: Vec<_> = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}", bucket, encoded.join("/"))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn ensure_bucket(&self) -> StorageResult<()> {
        let provisioning = |source: crate::BoxError| StorageError::BucketProvisioning {
            bucket: self.bucket.clone(),
            source,
        };

        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                tracing::debug!("bucket {} exists", self.bucket);
                return Ok(());
            }
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false);
                if !missing {
                    return Err(provisioning(err.into()));
                }
            }
        }

        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if let Some(region) = self.region.as_deref().filter(|r| *r != DEFAULT_REGION) {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                tracing::info!("bucket {} created", self.bucket);
                Ok(())
            }
            Err(err)
                if err
                    .as_service_error()
                    .map(|e| e.is_bucket_already_owned_by_you())
                    .unwrap_or(false) =>
            {
                Ok(())
            }
            Err(err) => Err(provisioning(err.into())),
        }
    }

    fn list<'a>(&'a self, prefix: &'a str, recursive: bool) -> ListStream<'a> {
        let pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .set_delimiter((!recursive).then(|| "/".to_owned()))
            .into_paginator()
            .send();

        futures::stream::unfold(pages, |mut pages| async move {
            pages.next().await.map(|page| (page, pages))
        })
        .map(move |page| {
            let page = page.map_err(|e| StorageError::operation(StoreOp::List, prefix, e))?;

            let prefixes = page
                .common_prefixes()
                .iter()
                .filter_map(|p| p.prefix())
                .map(ListedItem::common_prefix);
            let objects = page.contents().iter().filter_map(|o| {
                o.key()
                    .map(|key| ListedItem::object(key, o.size().unwrap_or(0).max(0) as u64))
            });

            Ok::<_, StorageError>(futures::stream::iter(
                objects
                    .chain(prefixes)
                    .map(Ok::<_, StorageError>)
                    .collect::<Vec<_>>(),
            ))
        })
        .try_flatten()
        .boxed()
    }

    async fn get(&self, key: &str) -> StorageResult<ObjectBody> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                let missing = err
                    .as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false);
                not_found_or(missing, key, || {
                    StorageError::operation(StoreOp::Get, key, err)
                })
            })?;

        let key = key.to_owned();
        let stream = futures::stream::unfold(Some(output.body), move |state| {
            let key = key.clone();
            async move {
                let mut body = state?;
                match body.next().await {
                    Some(Ok(chunk)) => Some((Ok(chunk), Some(body))),
                    Some(Err(e)) => Some((Err(StorageError::operation(StoreOp::Get, key, e)), None)),
                    None => None,
                }
            }
        });

        Ok(stream.boxed())
    }

    async fn put(
        &self,
        key: &str,
        mut body: ObjectBody,
        size_hint: Option<u64>,
    ) -> StorageResult<u64> {
        let initial = size_hint
            .map(|hint| hint.min(self.part_size as u64) as usize)
            .unwrap_or(0);
        let mut buffer = BytesMut::with_capacity(initial);

        let exhausted = !fill_part(&mut body, &mut buffer, self.part_size).await?;
        if exhausted && buffer.len() <= self.part_size {
            let written = buffer.len() as u64;
            self.put_single(key, buffer.freeze()).await?;
            tracing::debug!("stored {} ({} bytes, single request)", key, written);
            return Ok(written);
        }

        let written = self.put_multipart(key, body, buffer, exhausted).await?;
        tracing::debug!("stored {} ({} bytes, multipart)", key, written);
        Ok(written)
    }

    async fn delete_one(&self, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::operation(StoreOp::Delete, key, e))?;
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> StorageResult<Vec<DeleteFailure>> {
        let mut failures = Vec::new();

        for batch in keys.chunks(DELETE_BATCH_SIZE) {
            let first = batch.first().map(String::as_str).unwrap_or_default();

            let objects = batch
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StorageError::operation(StoreOp::Delete, first, e))?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| StorageError::operation(StoreOp::Delete, first, e))?;

            let output = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| StorageError::operation(StoreOp::Delete, first, e))?;

            failures.extend(output.errors().iter().map(|e| DeleteFailure {
                key: e.key().unwrap_or_default().to_owned(),
                message: format!(
                    "{}: {}",
                    e.code().unwrap_or("Unknown"),
                    e.message().unwrap_or("no message")
                ),
            }));
        }

        Ok(failures)
    }

    async fn copy(&self, src: &str, dst: &str) -> StorageResult<()> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .key(dst)
            .copy_source(encode_copy_source(&self.bucket, src))
            .send()
            .await
            .map_err(|err| {
                let missing = err
                    .as_service_error()
                    .and_then(|e| e.code())
                    .map(|code| code == "NoSuchKey")
                    .unwrap_or(false);
                not_found_or(missing, src, || {
                    StorageError::operation(StoreOp::Copy, src, err)
                })
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_source_keeps_separators_and_encodes_segments() {
        assert_eq!(
            encode_copy_source("user-files", "user-1-files/my docs/a+b.txt"),
            "user-files/user-1-files/my%20docs/a%2Bb.txt"
        );
    }

    #[test]
    fn config_from_env_defaults() {
        let config = S3Config::from_env(|_| None).unwrap();
        assert_eq!(config.bucket, "user-files");
        assert_eq!(config.region.as_deref(), Some("us-east-1"));
        assert!(config.force_path_style);
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn config_from_env_overrides() {
        let config = S3Config::from_env(|name| match name {
            "STOWAGE_S3_ENDPOINT" => Some("http://localhost:9000".into()),
            "STOWAGE_S3_BUCKET" => Some("files".into()),
            "STOWAGE_S3_FORCE_PATH_STYLE" => Some("false".into()),
            "STOWAGE_S3_ACCESS_KEY" => Some("  ".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.bucket, "files");
        assert!(!config.force_path_style);
        assert!(config.access_key.is_none());
    }

    #[test]
    fn config_from_env_rejects_bad_flag() {
        let result = S3Config::from_env(|name| {
            (name == "STOWAGE_S3_FORCE_PATH_STYLE").then(|| "yes".to_string())
        });
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn connect_rejects_blank_bucket() {
        let result = S3ObjectStore::connect(S3Config::default()).await;
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn connect_rejects_small_part_size() {
        let config = S3Config {
            bucket: "user-files".into(),
            part_size: 1024,
            ..S3Config::default()
        };
        let result = S3ObjectStore::connect(config).await;
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn connect_rejects_half_configured_credentials() {
        let config = S3Config {
            bucket: "user-files".into(),
            access_key: Some("minio".into()),
            ..S3Config::default()
        };
        let result = S3ObjectStore::connect(config).await;
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn fill_part_reports_exhaustion() {
        let mut body = crate::body::from_bytes(vec![1u8; 10]);
        let mut buffer = BytesMut::new();

        let more = fill_part(&mut body, &mut buffer, 4).await.unwrap();
        assert!(more);
        assert_eq!(buffer.len(), 10);

        let more = fill_part(&mut body, &mut buffer, 64).await.unwrap();
        assert!(!more);
    }
}
