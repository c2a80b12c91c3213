//! Loader options.
//!
//! Wire names are camelCase (`httpTimeoutInS`); snake_case aliases are
//! accepted so the same struct can be extracted from TOML settings and
//! `CONFSTACK_*` environment variables.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::constants::network as net_constants;
use crate::source::HttpTimings;
use crate::types::{ConfstackError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderOptions {
    /// JSON schema the merged configuration must satisfy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jsonschema: Option<Value>,

    /// Timeout of one url attempt, in seconds
    #[serde(alias = "http_timeout_request_in_s")]
    pub http_timeout_request_in_s: f64,

    /// Budget of one url layer, in seconds
    #[serde(alias = "http_timeout_in_s")]
    pub http_timeout_in_s: f64,

    /// Delay between two url attempts, in seconds
    #[serde(alias = "http_retry_delay_in_s")]
    pub http_retry_delay_in_s: f64,

    /// Base directory for relative `file` paths
    #[serde(alias = "base_dir", skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            jsonschema: None,
            http_timeout_request_in_s: net_constants::DEFAULT_TIMEOUT_REQUEST_SECS,
            http_timeout_in_s: net_constants::DEFAULT_TIMEOUT_SECS,
            http_retry_delay_in_s: net_constants::DEFAULT_RETRY_DELAY_SECS,
            base_dir: None,
        }
    }
}

impl LoaderOptions {
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.jsonschema = Some(schema);
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn with_http_timeouts(mut self, request: f64, total: f64, retry_delay: f64) -> Self {
        self.http_timeout_request_in_s = request;
        self.http_timeout_in_s = total;
        self.http_retry_delay_in_s = retry_delay;
        self
    }

    pub fn timings(&self) -> Result<HttpTimings> {
        HttpTimings::from_secs(
            self.http_timeout_request_in_s,
            self.http_timeout_in_s,
            self.http_retry_delay_in_s,
        )
    }

    /// Stricter check used for settings files: every duration must be
    /// positive and finite.
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("httpTimeoutRequestInS", self.http_timeout_request_in_s),
            ("httpTimeoutInS", self.http_timeout_in_s),
            ("httpRetryDelayInS", self.http_retry_delay_in_s),
        ];
        for (name, seconds) in durations {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(ConfstackError::Config(format!(
                    "'{}' must be a positive number of seconds, got {}",
                    name, seconds
                )));
            }
        }
        Ok(())
    }
}
