//! Object uploader
//!
//! Reads each resolved asset from the build directory, derives its transfer
//! metadata and puts it into the store. Puts run concurrently up to
//! `UploadOptions::concurrency`; the first failure ends the run.
//!
//! # Example
//!
//! ```no_run
//! use asset_sync::deploy::uploader::{ObjectUploader, UploadOptions};
//! use asset_sync::report::TracingReporter;
//! use asset_sync::store::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let uploader = ObjectUploader::new(&store, &TracingReporter);
//!
//! let options = UploadOptions::new("dist")
//!     .with_prefix("js-app")
//!     .with_manifest_key("manifest.txt");
//! let uploaded = uploader
//!     .upload(&["app.js".to_string(), "app.css".to_string()], &options)
//!     .await?;
//! println!("uploaded {} files", uploaded.len());
//! # Ok(())
//! # }
//! ```

use super::keys::join_key;
use super::metadata::TransferMetadata;
use super::retry::{NoRetry, RetryPolicy};
use super::DeployError;
use crate::metrics;
use crate::report::{LogOptions, Reporter};
use crate::store::{ObjectStore, PutAck, StoreError};
use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Default number of puts in flight at once
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 16;

/// Settings for one upload run
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Directory the relative asset paths are resolved against
    pub base_dir: PathBuf,
    /// Key namespace prepended to every object
    pub prefix: String,
    pub acl: Option<String>,
    /// Paths already gzip-compressed on disk
    pub gzipped_paths: HashSet<String>,
    /// Manifest path, republished with every run
    pub manifest_key: Option<String>,
    pub concurrency: usize,
    /// Limit for a single put, retries excluded
    pub timeout: Option<Duration>,
}

impl UploadOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            prefix: String::new(),
            acl: None,
            gzipped_paths: HashSet::new(),
            manifest_key: None,
            concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            timeout: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_acl(mut self, acl: impl Into<String>) -> Self {
        self.acl = Some(acl.into());
        self
    }

    pub fn with_gzipped<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gzipped_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_manifest_key(mut self, key: impl Into<String>) -> Self {
        self.manifest_key = Some(key.into());
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Paths a run uploads: the resolved set plus the manifest itself
    pub fn upload_list(&self, resolved: &[String]) -> Vec<String> {
        let mut paths = resolved.to_vec();
        if let Some(manifest) = &self.manifest_key {
            if !paths.iter().any(|p| p == manifest) {
                paths.push(manifest.clone());
            }
        }
        paths
    }
}

/// Uploads resolved assets to an object store
pub struct ObjectUploader<'a> {
    store: &'a dyn ObjectStore,
    reporter: &'a dyn Reporter,
    retry: &'a dyn RetryPolicy,
}

impl<'a> ObjectUploader<'a> {
    pub fn new(store: &'a dyn ObjectStore, reporter: &'a dyn Reporter) -> Self {
        Self {
            store,
            reporter,
            retry: &NoRetry,
        }
    }

    pub fn with_retry_policy(mut self, retry: &'a dyn RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Upload every resolved path and return the ones that succeeded
    ///
    /// Completion order, not input order. Any failure fails the whole run;
    /// objects already stored stay in place.
    #[tracing::instrument(
        name = "deploy.upload",
        skip(self, resolved, options),
        fields(
            deploy.prefix = %options.prefix,
            deploy.files = resolved.len(),
            deploy.concurrency = options.concurrency
        ),
        err
    )]
    pub async fn upload(
        &self,
        resolved: &[String],
        options: &UploadOptions,
    ) -> Result<Vec<String>, DeployError> {
        let paths = options.upload_list(resolved);
        let concurrency = options.concurrency.max(1);

        stream::iter(paths)
            .map(|path| self.upload_one(path, options))
            .buffer_unordered(concurrency)
            .try_collect()
            .await
    }

    async fn upload_one(
        &self,
        path: String,
        options: &UploadOptions,
    ) -> Result<String, DeployError> {
        // Relative to the build directory, like the remote key
        let file_path = options.base_dir.join(path.trim_start_matches('/'));
        let body = tokio::fs::read(&file_path)
            .await
            .map_err(|source| DeployError::FileRead {
                path: file_path.clone(),
                source,
            })?;

        let metadata = TransferMetadata::for_path(
            &path,
            options.gzipped_paths.contains(&path),
            options.acl.as_deref(),
        );
        let key = join_key(&options.prefix, &path);
        let bytes = body.len() as u64;

        let start_time = Instant::now();
        let result = self
            .put_with_retry(&key, Bytes::from(body), &metadata, options.timeout)
            .await;
        let duration = start_time.elapsed();
        metrics::record_put_duration(duration.as_secs_f64());

        match result {
            Ok(ack) => {
                metrics::record_upload_success(bytes);
                tracing::debug!(
                    key = %key,
                    bytes = bytes,
                    content_type = %metadata.content_type,
                    etag = ?ack.etag,
                    duration_ms = duration.as_millis(),
                    "Put completed"
                );
                self.reporter.log(&format!("✔  {}", key), LogOptions::verbose());
                Ok(path)
            }
            Err(e) => {
                metrics::record_upload_failure();
                tracing::error!(
                    key = %key,
                    error = %e,
                    duration_ms = duration.as_millis(),
                    "Put failed"
                );
                Err(DeployError::Upload(e))
            }
        }
    }

    async fn put_with_retry(
        &self,
        key: &str,
        body: Bytes,
        metadata: &TransferMetadata,
        timeout: Option<Duration>,
    ) -> Result<PutAck, StoreError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let put = self.store.put(key, body.clone(), metadata);
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, put)
                    .await
                    .unwrap_or_else(|_| Err(StoreError::Timeout(limit))),
                None => put.await,
            };

            match result {
                Ok(ack) => return Ok(ack),
                Err(e) => match self.retry.retry_after(attempt, &e) {
                    Some(delay) => {
                        tracing::warn!(
                            key = %key,
                            attempt = attempt,
                            error = %e,
                            delay_ms = delay.as_millis(),
                            "Retrying put"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e),
                },
            }
        }
    }
}
