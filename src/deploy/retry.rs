//! Retry policy for failed puts
//!
//! Deploys do not retry by default. A policy can be plugged into
//! [`super::uploader::ObjectUploader::with_retry_policy`] to change that.

use crate::store::StoreError;
use std::time::Duration;

/// Decides whether a failed put is attempted again
pub trait RetryPolicy: Send + Sync {
    /// Delay before attempt `attempt + 1`, or `None` to give up
    ///
    /// `attempt` counts from 1 for the first failed try.
    fn retry_after(&self, attempt: u32, error: &StoreError) -> Option<Duration>;
}

/// Never retries
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn retry_after(&self, _attempt: u32, _error: &StoreError) -> Option<Duration> {
        None
    }
}
