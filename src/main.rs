//! asset-sync - differential static asset deployer
//!
//! Uploads new build artifacts to an S3-compatible bucket, skipping files
//! already listed in the remote manifest.

use anyhow::Context;
use asset_sync::deploy::Deployer;
use asset_sync::files::scan_dist;
use asset_sync::report::TracingReporter;
use asset_sync::store::{MemoryStore, ObjectStore, S3ObjectStore};
use asset_sync::{logging, metrics, Config};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// asset-sync - Differential static asset deploys to object storage
#[derive(Parser, Debug)]
#[command(name = "asset-sync")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "asset-sync.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Resolve and "upload" against an in-memory store instead of the bucket
    #[arg(long)]
    dry_run: bool,

    /// Write Prometheus metrics to this file when the run ends
    #[arg(long)]
    metrics_file: Option<PathBuf>,

    /// Format of the uploaded file list printed on stdout
    #[arg(short, long, value_enum, default_value_t = Output::Text)]
    output: Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::init(logging::parse_level(&args.log_level), args.json_logs)
        .map_err(|e| anyhow::anyhow!(e))?;

    info!("Starting asset-sync v{}", asset_sync::VERSION);

    let config = Config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    info!("Loaded configuration from {:?}", args.config);

    let base = args
        .config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let options = config.upload_options(base);

    let dist_files = scan_dist(&options.base_dir)?;
    let candidates = config.file_pattern()?.filter(&dist_files);
    info!(
        dist_dir = %options.base_dir.display(),
        files = dist_files.len(),
        candidates = candidates.len(),
        pattern = %config.deploy.file_pattern,
        "Collected build output"
    );

    let store: Arc<dyn ObjectStore> = if args.dry_run {
        info!("Dry run: using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(S3ObjectStore::new(config.s3_store_config()?).await)
    };

    let deployer = Deployer::new(store, Arc::new(TracingReporter), &config.store.bucket);
    let result = deployer.run(&candidates, &options).await;

    if let Some(path) = &args.metrics_file {
        std::fs::write(path, metrics::render()?)
            .with_context(|| format!("writing metrics to {}", path.display()))?;
    }

    let report = result?;
    match args.output {
        Output::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Output::Text => {
            for file in &report.files_uploaded {
                println!("{}", file);
            }
        }
    }

    Ok(())
}
