//! Object store module
//!
//! Defines the object store capability the deployer talks to, plus the
//! implementations shipped with the crate.
//!
//! # Implementations
//!
//! - `S3ObjectStore` - `aws-sdk-s3` client for S3-compatible endpoints (AWS S3, Aliyun OSS, MinIO)
//! - `MemoryStore` - In-process store for tests and dry runs
//!
//! # Example
//!
//! ```no_run
//! use asset_sync::deploy::metadata::TransferMetadata;
//! use asset_sync::store::{MemoryStore, ObjectStore};
//! use bytes::Bytes;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let metadata = TransferMetadata::for_path("app.css", false, None);
//! store.put("assets/app.css", Bytes::from("body {}"), &metadata).await?;
//!
//! let body = store.get("assets/app.css").await?;
//! assert_eq!(body, Bytes::from("body {}"));
//! # Ok(())
//! # }
//! ```

use crate::deploy::metadata::TransferMetadata;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

pub mod credentials;
pub mod memory;
pub mod s3;

pub use credentials::{Credentials, CredentialsError, CredentialsProvider};
pub use memory::MemoryStore;
pub use s3::{S3ObjectStore, S3StoreConfig};

/// Object store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Provider error ({status} {code}): {message}")]
    Provider {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Acknowledgement returned by a successful put
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutAck {
    pub etag: Option<String>,
}

/// Object store capability
///
/// Implementations must be safe to call concurrently: a single uploader run
/// shares one store across every in-flight put.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full body of an object
    async fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Store an object under `key` with the given transfer metadata
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        metadata: &TransferMetadata,
    ) -> Result<PutAck, StoreError>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        (**self).get(key).await
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        metadata: &TransferMetadata,
    ) -> Result<PutAck, StoreError> {
        (**self).put(key, body, metadata).await
    }
}
