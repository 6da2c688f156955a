//! Metrics module
//!
//! Prometheus metrics for deploy runs. The CLI can dump them in text
//! exposition format for a node-exporter textfile collector.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Encoder,
    Histogram, TextEncoder,
};

lazy_static! {
    // Upload metrics
    pub static ref UPLOADS_TOTAL: CounterVec = register_counter_vec!(
        "asset_sync_uploads_total",
        "Total number of object puts",
        &["status"]
    ).unwrap();

    pub static ref UPLOAD_BYTES_TOTAL: Counter = register_counter!(
        "asset_sync_upload_bytes_total",
        "Total bytes uploaded"
    ).unwrap();

    pub static ref PUT_DURATION: Histogram = register_histogram!(
        "asset_sync_put_duration_seconds",
        "Object put duration in seconds",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]
    ).unwrap();

    // Manifest metrics
    pub static ref MANIFEST_LOOKUPS: CounterVec = register_counter_vec!(
        "asset_sync_manifest_lookups_total",
        "Manifest lookups by outcome",
        &["outcome"]  // "found" or "missing"
    ).unwrap();
}

/// Record a successful put
pub fn record_upload_success(bytes: u64) {
    UPLOADS_TOTAL.with_label_values(&["success"]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(bytes as f64);
}

/// Record a failed put
pub fn record_upload_failure() {
    UPLOADS_TOTAL.with_label_values(&["failure"]).inc();
}

/// Record put duration
pub fn record_put_duration(duration_secs: f64) {
    PUT_DURATION.observe(duration_secs);
}

/// Record whether the remote manifest was usable
pub fn record_manifest_lookup(found: bool) {
    let outcome = if found { "found" } else { "missing" };
    MANIFEST_LOOKUPS.with_label_values(&[outcome]).inc();
}

/// Render all registered metrics in Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
