//! Deploy module
//!
//! Differential asset deploys: resolve the files that still need publishing
//! against the remote manifest, then upload them.
//!
//! # Example
//!
//! ```no_run
//! use asset_sync::deploy::{Deployer, UploadOptions};
//! use asset_sync::report::TracingReporter;
//! use asset_sync::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let deployer = Deployer::new(Arc::new(MemoryStore::new()), Arc::new(TracingReporter), "assets");
//! let options = UploadOptions::new("dist").with_manifest_key("manifest.txt");
//! let report = deployer
//!     .run(&["app.js".to_string(), "app.css".to_string()], &options)
//!     .await?;
//! println!("uploaded {} files", report.files_uploaded.len());
//! # Ok(())
//! # }
//! ```

use crate::report::{Color, LogOptions, Reporter};
use crate::store::{ObjectStore, StoreError};
use serde::Serialize;
use std::error::Error as _;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub mod keys;
pub mod manifest;
pub mod metadata;
pub mod retry;
pub mod uploader;

pub use manifest::ManifestResolver;
pub use metadata::TransferMetadata;
pub use retry::{NoRetry, RetryPolicy};
pub use uploader::{ObjectUploader, UploadOptions};

/// Deploy errors
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Failed to read {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Upload(#[from] StoreError),
}

/// Outcome of a successful deploy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    /// Uploaded relative paths, in completion order
    pub files_uploaded: Vec<String>,
}

/// Runs resolver and uploader against one store
pub struct Deployer {
    store: Arc<dyn ObjectStore>,
    reporter: Arc<dyn Reporter>,
    retry: Arc<dyn RetryPolicy>,
    bucket: String,
}

impl Deployer {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        reporter: Arc<dyn Reporter>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            store,
            reporter,
            retry: Arc::new(NoRetry),
            bucket: bucket.into(),
        }
    }

    pub fn with_retry_policy(mut self, retry: Arc<dyn RetryPolicy>) -> Self {
        self.retry = retry;
        self
    }

    /// Deploy `candidates`, skipping those already listed in the manifest
    pub async fn run(
        &self,
        candidates: &[String],
        options: &UploadOptions,
    ) -> Result<DeployReport, DeployError> {
        self.reporter.log(
            &format!("preparing to upload to bucket `{}`", self.bucket),
            LogOptions::verbose(),
        );

        let resolver = ManifestResolver::new(self.store.as_ref(), self.reporter.as_ref());
        let resolved = resolver
            .resolve(candidates, options.manifest_key.as_deref(), &options.prefix)
            .await;

        let uploader = ObjectUploader::new(self.store.as_ref(), self.reporter.as_ref())
            .with_retry_policy(self.retry.as_ref());

        match uploader.upload(&resolved, options).await {
            Ok(files_uploaded) => {
                self.reporter.log(
                    &format!("uploaded {} files ok", files_uploaded.len()),
                    LogOptions::verbose(),
                );
                Ok(DeployReport { files_uploaded })
            }
            Err(e) => {
                self.report_error(&e);
                Err(e)
            }
        }
    }

    fn report_error(&self, error: &DeployError) {
        let red = LogOptions::default().with_color(Color::Red);
        self.reporter.log(&error.to_string(), red);

        let mut source = error.source();
        while let Some(cause) = source {
            self.reporter.log(&format!("caused by: {}", cause), red);
            source = cause.source();
        }
    }
}
