//! In-memory object store
//!
//! Backs dry runs and tests. Every put is recorded so callers can inspect
//! the metadata that would have been sent, and individual keys can be made
//! to fail.

use super::{ObjectStore, PutAck, StoreError};
use crate::deploy::metadata::TransferMetadata;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;

/// A put recorded by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPut {
    pub key: String,
    pub body: Bytes,
    pub metadata: TransferMetadata,
}

/// In-memory object store
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: DashMap<String, Bytes>,
    failures: DashMap<String, StoreError>,
    puts: Mutex<Vec<RecordedPut>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording a put
    pub fn insert(&self, key: impl Into<String>, body: impl Into<Bytes>) {
        self.objects.insert(key.into(), body.into());
    }

    /// Make every operation on `key` fail with `error`
    pub fn fail_key(&self, key: impl Into<String>, error: StoreError) {
        self.failures.insert(key.into(), error);
    }

    /// Puts in the order they completed
    pub fn puts(&self) -> Vec<RecordedPut> {
        self.puts.lock().clone()
    }

    /// Number of puts issued so far, failed ones excluded
    pub fn put_count(&self) -> usize {
        self.puts.lock().len()
    }

    /// Current body stored under `key`
    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.get(key).map(|entry| entry.value().clone())
    }

    fn check_failure(&self, key: &str) -> Result<(), StoreError> {
        match self.failures.get(key) {
            Some(err) => Err(err.value().clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        self.check_failure(key)?;
        self.object(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        metadata: &TransferMetadata,
    ) -> Result<PutAck, StoreError> {
        self.check_failure(key)?;

        tracing::trace!(key = %key, bytes = body.len(), "MemoryStore put");
        self.objects.insert(key.to_string(), body.clone());
        self.puts.lock().push(RecordedPut {
            key: key.to_string(),
            body,
            metadata: metadata.clone(),
        });

        Ok(PutAck::default())
    }
}
