//! Manifest resolver
//!
//! Decides which candidate files still need uploading. The manifest is a
//! newline-delimited list of previously published paths stored at
//! `{prefix}/{manifest_key}`; anything listed there is skipped. When the
//! manifest cannot be fetched or decoded the deploy falls back to uploading
//! every candidate.

use super::keys::join_key;
use crate::metrics;
use crate::report::{Color, LogOptions, Reporter};
use crate::store::{ObjectStore, StoreError};
use std::collections::HashSet;
use thiserror::Error;

/// Why a manifest could not be used
///
/// Never surfaced to callers; any of these downgrades the run to a full
/// deploy.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to fetch manifest: {0}")]
    Fetch(#[from] StoreError),

    #[error("Manifest is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}

/// Split manifest text into entries, one per line
pub fn parse_manifest(text: &str) -> Vec<String> {
    text.split('\n').map(String::from).collect()
}

/// Candidates not listed in the manifest, in candidate order
pub fn difference(candidates: &[String], published: &[String]) -> Vec<String> {
    let published: HashSet<&str> = published.iter().map(String::as_str).collect();
    candidates
        .iter()
        .filter(|path| !published.contains(path.as_str()))
        .cloned()
        .collect()
}

/// Resolves the differential upload set against a remote manifest
pub struct ManifestResolver<'a> {
    store: &'a dyn ObjectStore,
    reporter: &'a dyn Reporter,
}

impl<'a> ManifestResolver<'a> {
    pub fn new(store: &'a dyn ObjectStore, reporter: &'a dyn Reporter) -> Self {
        Self { store, reporter }
    }

    /// Return the candidates that are not yet published
    ///
    /// Without a manifest key every candidate is returned. Fetch failures are
    /// logged and absorbed.
    pub async fn resolve(
        &self,
        candidates: &[String],
        manifest_key: Option<&str>,
        prefix: &str,
    ) -> Vec<String> {
        let Some(manifest_key) = manifest_key else {
            return candidates.to_vec();
        };

        let key = join_key(prefix, manifest_key);
        self.reporter.log(
            &format!(
                "Downloading manifest for differential deploy from `{}`...",
                key
            ),
            LogOptions::verbose(),
        );

        match self.fetch(&key).await {
            Ok(published) => {
                metrics::record_manifest_lookup(true);
                self.reporter.log(
                    "Manifest found. Differential deploy will be applied.",
                    LogOptions::verbose(),
                );
                let remaining = difference(candidates, &published);
                tracing::debug!(
                    manifest = %key,
                    candidates = candidates.len(),
                    remaining = remaining.len(),
                    "Applied manifest"
                );
                remaining
            }
            Err(e) => {
                metrics::record_manifest_lookup(false);
                tracing::debug!(manifest = %key, error = %e, "Manifest unavailable");
                self.reporter.log(
                    "Manifest not found. Disabling differential deploy.",
                    LogOptions::verbose().with_color(Color::Yellow),
                );
                candidates.to_vec()
            }
        }
    }

    async fn fetch(&self, key: &str) -> Result<Vec<String>, ManifestError> {
        let body = self.store.get(key).await?;
        let text = String::from_utf8(body.to_vec())?;
        Ok(parse_manifest(&text))
    }
}
