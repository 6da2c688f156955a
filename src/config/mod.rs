//! Configuration module for asset-sync
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation.
//!
//! # Example
//!
//! ```yaml
//! store:
//!   bucket: "my-assets"
//!   region: "oss-cn-hangzhou"
//!   endpoint: "https://oss-cn-hangzhou.aliyuncs.com"
//!   access_key: "${OSS_ACCESS_KEY_ID}"
//!   secret_key: "${OSS_ACCESS_KEY_SECRET}"
//! deploy:
//!   dist_dir: "dist"
//!   prefix: "js-app"
//!   manifest_path: "manifest.txt"
//! upload:
//!   concurrency: 8
//! ```

use crate::deploy::uploader::{UploadOptions, DEFAULT_UPLOAD_CONCURRENCY};
use crate::files::{FilePattern, DEFAULT_FILE_PATTERN};
use crate::store::{CredentialsProvider, S3StoreConfig, StoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.bucket.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.bucket is required".into(),
            ));
        }

        if self.store.region.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.region cannot be empty".into(),
            ));
        }

        if let Some(ref endpoint) = self.store.endpoint {
            if !is_valid_http_url(endpoint) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid endpoint '{}': must start with http:// or https://",
                    endpoint
                )));
            }
        }

        CredentialsProvider::resolve(&self.store)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.upload.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "upload.concurrency must be at least 1".into(),
            ));
        }

        if self.upload.timeout_seconds == Some(0) {
            return Err(ConfigError::ValidationError(
                "upload.timeout_seconds must be greater than 0".into(),
            ));
        }

        if let Some(ref manifest) = self.deploy.manifest_path {
            if manifest.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "deploy.manifest_path cannot be empty".into(),
                ));
            }
        }

        self.file_pattern()?;

        Ok(())
    }

    /// Compiled `deploy.file_pattern`
    pub fn file_pattern(&self) -> Result<FilePattern, ConfigError> {
        FilePattern::new(&self.deploy.file_pattern)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// S3 store settings, with credentials resolved
    pub fn s3_store_config(&self) -> Result<S3StoreConfig, StoreError> {
        let credentials = CredentialsProvider::resolve(&self.store)
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(S3StoreConfig {
            bucket: self.store.bucket.clone(),
            region: self.store.region.clone(),
            endpoint: self.store.endpoint.clone(),
            path_style: self.store.path_style,
            credentials,
            timeout: self.upload.timeout(),
        })
    }

    /// Upload options for one run
    ///
    /// `dist_dir` is resolved relative to `base` when it is not absolute.
    pub fn upload_options(&self, base: &Path) -> UploadOptions {
        let mut options = UploadOptions::new(self.dist_dir(base))
            .with_prefix(self.deploy.prefix.clone())
            .with_gzipped(self.deploy.gzipped_files.iter().cloned())
            .with_concurrency(self.upload.concurrency);

        if !self.deploy.acl.is_empty() {
            options = options.with_acl(self.deploy.acl.clone());
        }
        if let Some(ref manifest) = self.deploy.manifest_path {
            options = options.with_manifest_key(manifest.clone());
        }
        if let Some(timeout) = self.upload.timeout() {
            options = options.with_timeout(timeout);
        }
        options
    }

    /// Build output directory
    pub fn dist_dir(&self, base: &Path) -> PathBuf {
        if self.deploy.dist_dir.is_absolute() {
            self.deploy.dist_dir.clone()
        } else {
            base.join(&self.deploy.dist_dir)
        }
    }
}

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Object store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub path_style: bool,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Deploy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_acl")]
    pub acl: String,
    /// Paths (relative to `dist_dir`) already gzip-compressed on disk
    #[serde(default)]
    pub gzipped_files: Vec<String>,
    /// Remote manifest path for differential deploys
    #[serde(default)]
    pub manifest_path: Option<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            dist_dir: default_dist_dir(),
            file_pattern: default_file_pattern(),
            prefix: String::new(),
            acl: default_acl(),
            gzipped_files: Vec::new(),
            manifest_path: None,
        }
    }
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_file_pattern() -> String {
    DEFAULT_FILE_PATTERN.to_string()
}

fn default_acl() -> String {
    "public-read".to_string()
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-put timeout; unset means wait as long as the transport does
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl UploadConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_seconds: None,
        }
    }
}

fn default_concurrency() -> usize {
    DEFAULT_UPLOAD_CONCURRENCY
}
