//! Transfer metadata
//!
//! Headers sent with every uploaded asset. They depend only on the asset
//! path, whether it is pre-compressed, and the run's ACL.

use chrono::{DateTime, TimeZone, Utc};

/// Two years, in seconds
pub const CACHE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365 * 2;

/// `Cache-Control` value applied to every asset
pub const CACHE_CONTROL: &str = "max-age=63072000, public";

/// `Content-Encoding` value for pre-compressed assets
pub const GZIP_ENCODING: &str = "gzip";

/// Fallback when the extension is unknown
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Far-future `Expires` date: 2030-01-01T00:00:00Z
pub fn far_future_expiry() -> DateTime<Utc> {
    Utc.timestamp_opt(1_893_456_000, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Charset for textual MIME types
///
/// `text/*`, `application/javascript` and `application/json` are served
/// as UTF-8; everything else has no charset.
pub fn charset_for(mime: &str) -> Option<&'static str> {
    let textual = mime.starts_with("text/")
        || mime.starts_with("application/javascript")
        || mime.starts_with("application/json");
    textual.then_some("UTF-8")
}

/// Content type for a path, with a lowercased charset suffix when textual
pub fn content_type_for(path: &str) -> String {
    let mime = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    match charset_for(mime) {
        Some(charset) => format!("{}; charset={}", mime, charset.to_lowercase()),
        None => mime.to_string(),
    }
}

/// Metadata sent alongside one object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferMetadata {
    pub content_type: String,
    pub cache_control: String,
    pub expires: DateTime<Utc>,
    pub content_encoding: Option<String>,
    pub acl: Option<String>,
}

impl TransferMetadata {
    /// Derive metadata for a relative asset path
    pub fn for_path(path: &str, gzipped: bool, acl: Option<&str>) -> Self {
        Self {
            content_type: content_type_for(path),
            cache_control: CACHE_CONTROL.to_string(),
            expires: far_future_expiry(),
            content_encoding: gzipped.then(|| GZIP_ENCODING.to_string()),
            acl: acl.filter(|a| !a.is_empty()).map(String::from),
        }
    }

    /// `Expires` header value in IMF-fixdate form
    pub fn expires_header(&self) -> String {
        self.expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
    }
}
