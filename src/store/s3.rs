//! S3-compatible object store
//!
//! Backed by `aws-sdk-s3`, so it works against AWS S3 and any endpoint that
//! speaks the S3 dialect (Aliyun OSS in S3-compatible mode, MinIO). Point
//! `endpoint` at the service endpoint; the bucket is added by the SDK, as a
//! host label or, with `path_style`, as the first path segment.
//!
//! # Example
//!
//! ```no_run
//! use asset_sync::store::{Credentials, ObjectStore, S3ObjectStore, S3StoreConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = S3StoreConfig {
//!     bucket: "my-assets".to_string(),
//!     region: "oss-cn-hangzhou".to_string(),
//!     endpoint: Some("https://oss-cn-hangzhou.aliyuncs.com".to_string()),
//!     path_style: false,
//!     credentials: Credentials::new("access-key", "secret-key"),
//!     timeout: None,
//! };
//!
//! let store = S3ObjectStore::new(config).await;
//! let manifest = store.get("manifest.txt").await?;
//! println!("{} bytes", manifest.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Tracing
//!
//! | Operation | Span Name | Attributes |
//! |-----------|-----------|------------|
//! | GetObject | `store.get` | bucket, key, bytes |
//! | PutObject | `store.put` | bucket, key, bytes, content_type, etag |

use super::{Credentials, ObjectStore, PutAck, StoreError};
use crate::deploy::metadata::TransferMetadata;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{Region, RequestChecksumCalculation};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::{ByteStream, DateTime as SdkDateTime};
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client as S3Client;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use bytes::Bytes;
use std::time::Duration;

/// Provider name attached to the SDK credentials
const CREDENTIALS_PROVIDER: &str = "asset-sync";

/// S3 store configuration
#[derive(Debug, Clone)]
pub struct S3StoreConfig {
    pub bucket: String,
    pub region: String,
    /// Service endpoint; AWS S3 for the region when unset
    pub endpoint: Option<String>,
    /// Address objects as `{endpoint}/{bucket}/{key}` instead of `{bucket}.{host}/{key}`
    pub path_style: bool,
    pub credentials: Credentials,
    /// Whole-operation timeout enforced by the SDK
    pub timeout: Option<Duration>,
}

/// S3-compatible object store client
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
    timeout: Option<Duration>,
}

impl S3ObjectStore {
    /// Build the SDK client for `config`
    ///
    /// SDK retries are disabled; retrying is left to the uploader's
    /// `RetryPolicy`.
    pub async fn new(config: S3StoreConfig) -> Self {
        let credentials = aws_credential_types::Credentials::new(
            config.credentials.access_key_id(),
            config.credentials.secret_access_key(),
            config.credentials.session_token().map(String::from),
            None,
            CREDENTIALS_PROVIDER,
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled());

        if let Some(ref endpoint) = config.endpoint {
            loader = loader.endpoint_url(endpoint.trim_end_matches('/'));
        }
        if let Some(timeout) = config.timeout {
            loader =
                loader.timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build());
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.path_style)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .build();

        Self::from_client(S3Client::from_conf(s3_config), config.bucket, config.timeout)
    }

    /// Wrap an already configured SDK client
    pub fn from_client(
        client: S3Client,
        bucket: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            timeout,
        }
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn store_error<E>(&self, key: &str, err: SdkError<E, HttpResponse>) -> StoreError
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        classify_sdk_error(key, err, self.timeout)
    }
}

/// Map an SDK failure onto the store error taxonomy
///
/// Responses are classified by status: 404 is `NotFound`, 401 and 403 are
/// `PermissionDenied`, anything else is `Provider` with the error code and
/// message the service returned.
pub fn classify_sdk_error<E>(
    key: &str,
    err: SdkError<E, HttpResponse>,
    timeout: Option<Duration>,
) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = match &err {
        SdkError::TimeoutError(_) => {
            return StoreError::Timeout(timeout.unwrap_or_default());
        }
        SdkError::DispatchFailure(failure) if failure.is_timeout() => {
            return StoreError::Timeout(timeout.unwrap_or_default());
        }
        SdkError::ServiceError(context) => context.raw().status().as_u16(),
        SdkError::ResponseError(context) => context.raw().status().as_u16(),
        _ => return StoreError::Network(DisplayErrorContext(&err).to_string()),
    };

    let message = err
        .message()
        .map(String::from)
        .unwrap_or_else(|| status_reason(status).to_string());

    match status {
        404 => StoreError::NotFound(key.to_string()),
        401 | 403 => StoreError::PermissionDenied(format!("{}: {}", key, message)),
        _ => StoreError::Provider {
            status,
            code: err
                .code()
                .map(String::from)
                .unwrap_or_else(|| status.to_string()),
            message,
        },
    }
}

fn status_reason(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "unexpected response",
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[tracing::instrument(
        name = "store.get",
        skip(self),
        fields(
            store.bucket = %self.bucket,
            store.key = %key,
            download.bytes = tracing::field::Empty
        ),
        err
    )]
    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| self.store_error(key, e))?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?
            .into_bytes();
        tracing::Span::current().record("download.bytes", body.len());

        Ok(body)
    }

    #[tracing::instrument(
        name = "store.put",
        skip(self, body, metadata),
        fields(
            store.bucket = %self.bucket,
            store.key = %key,
            http.content_type = %metadata.content_type,
            upload.bytes = body.len(),
            store.etag = tracing::field::Empty
        ),
        err
    )]
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        metadata: &TransferMetadata,
    ) -> Result<PutAck, StoreError> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(&metadata.content_type)
            .cache_control(&metadata.cache_control)
            .expires(SdkDateTime::from_secs(metadata.expires.timestamp()))
            .body(ByteStream::from(body));

        if let Some(ref encoding) = metadata.content_encoding {
            request = request.content_encoding(encoding);
        }
        if let Some(ref acl) = metadata.acl {
            request = request.acl(ObjectCannedAcl::from(acl.as_str()));
        }

        let output = request.send().await.map_err(|e| self.store_error(key, e))?;

        let etag = output.e_tag().map(String::from);
        if let Some(ref etag) = etag {
            tracing::Span::current().record("store.etag", etag.as_str());
        }

        Ok(PutAck { etag })
    }
}
