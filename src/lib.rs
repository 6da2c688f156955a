//! asset-sync library
//!
//! Differential deploys of built static assets to S3-compatible object
//! storage.
//!
//! # Features
//!
//! - **Differential**: Skips files listed in the previously published manifest
//! - **Cache Friendly**: Long-lived cache headers, charset-aware content types
//! - **Pre-compressed Assets**: Marks gzipped files with `Content-Encoding`
//! - **Concurrent**: Bounded parallel puts, failing fast on the first error
//! - **Pluggable Store**: Anything implementing [`store::ObjectStore`]
//!
//! # Example
//!
//! ```no_run
//! use asset_sync::config::Config;
//! use asset_sync::deploy::Deployer;
//! use asset_sync::files::scan_dist;
//! use asset_sync::report::TracingReporter;
//! use asset_sync::store::S3ObjectStore;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("asset-sync.yaml")?;
//!     let options = config.upload_options(Path::new("."));
//!     let candidates = config.file_pattern()?.filter(&scan_dist(&options.base_dir)?);
//!
//!     let store = S3ObjectStore::new(config.s3_store_config()?).await;
//!     let deployer = Deployer::new(
//!         Arc::new(store),
//!         Arc::new(TracingReporter),
//!         &config.store.bucket,
//!     );
//!     deployer.run(&candidates, &options).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod deploy;
pub mod files;
pub mod logging;
pub mod metrics;
pub mod report;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use deploy::{DeployError, DeployReport, Deployer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
