//! Url Layer Timing
//!
//! Durations of the url retry/timeout race, built from the loader's
//! fractional-second options, and the per-attempt timeout wrapper.

use std::future::Future;
use std::time::Duration;

use super::http::{HttpError, HttpResponse};
use crate::constants::network as net_constants;
use crate::types::{ConfstackError, Result};

/// Timing of one url layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HttpTimings {
    /// Timeout of one attempt
    pub request: Duration,
    /// Budget of the whole layer
    pub total: Duration,
    /// Delay between two attempts
    pub retry_delay: Duration,
    /// `total` as configured, for the timeout message
    pub total_secs: f64,
}

impl Default for HttpTimings {
    fn default() -> Self {
        Self {
            request: Duration::from_secs_f64(net_constants::DEFAULT_TIMEOUT_REQUEST_SECS),
            total: Duration::from_secs_f64(net_constants::DEFAULT_TIMEOUT_SECS),
            retry_delay: Duration::from_secs_f64(net_constants::DEFAULT_RETRY_DELAY_SECS),
            total_secs: net_constants::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HttpTimings {
    /// Build from seconds. Negative or non-finite values are rejected.
    pub fn from_secs(request: f64, total: f64, retry_delay: f64) -> Result<Self> {
        Ok(Self {
            request: to_duration("httpTimeoutRequestInS", request)?,
            total: to_duration("httpTimeoutInS", total)?,
            retry_delay: to_duration("httpRetryDelayInS", retry_delay)?,
            total_secs: total,
        })
    }
}

fn to_duration(name: &str, seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| ConfstackError::Config(format!("'{}' is not a valid duration ({}): {}", name, seconds, e)))
}

/// Run one request, failing with `timeout of <ms>ms exceeded` when it does
/// not settle within `timeout`.
pub async fn with_attempt_timeout<F>(
    timeout: Duration,
    future: F,
) -> std::result::Result<HttpResponse, HttpError>
where
    F: Future<Output = std::result::Result<HttpResponse, HttpError>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(HttpError::timeout(timeout)),
    }
}
