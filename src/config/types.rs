//! Settings Types
//!
//! Settings of the `confstack` tool itself, as read from TOML files and
//! `CONFSTACK_*` environment variables. They become [`LoaderOptions`] once
//! the optional schema file has been read.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::network as net_constants;
use crate::loader::LoaderOptions;
use crate::storage::FileFormat;
use crate::types::{ConfstackError, Result};

/// Root settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Timeout of one url attempt (seconds)
    pub http_timeout_request_in_s: f64,

    /// Budget of one url layer (seconds)
    pub http_timeout_in_s: f64,

    /// Delay between url attempts (seconds)
    pub http_retry_delay_in_s: f64,

    /// Base directory for relative layer files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,

    /// JSON schema file (JSON, YAML or TOML)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            http_timeout_request_in_s: net_constants::DEFAULT_TIMEOUT_REQUEST_SECS,
            http_timeout_in_s: net_constants::DEFAULT_TIMEOUT_SECS,
            http_retry_delay_in_s: net_constants::DEFAULT_RETRY_DELAY_SECS,
            base_dir: None,
            schema_file: None,
        }
    }
}

impl Settings {
    /// Validate settings values.
    /// Returns `ConfstackError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        self.loader_options_without_schema().validate()?;

        if let Some(schema_file) = &self.schema_file
            && FileFormat::from_path(schema_file).is_none()
        {
            return Err(ConfstackError::Config(format!(
                "schema_file must be a .json, .yaml, .yml or .toml file, got {}",
                schema_file.display()
            )));
        }

        Ok(())
    }

    /// Build loader options, reading the schema file when one is set.
    pub fn to_loader_options(&self) -> Result<LoaderOptions> {
        let mut options = self.loader_options_without_schema();
        if let Some(schema_file) = &self.schema_file {
            options.jsonschema = Some(read_schema(schema_file)?);
        }
        Ok(options)
    }

    fn loader_options_without_schema(&self) -> LoaderOptions {
        LoaderOptions {
            jsonschema: None,
            http_timeout_request_in_s: self.http_timeout_request_in_s,
            http_timeout_in_s: self.http_timeout_in_s,
            http_retry_delay_in_s: self.http_retry_delay_in_s,
            base_dir: self.base_dir.clone(),
        }
    }
}

fn read_schema(path: &std::path::Path) -> Result<serde_json::Value> {
    let format = FileFormat::from_path(path).ok_or_else(|| {
        ConfstackError::Config(format!("unsupported schema format: {}", path.display()))
    })?;
    let contents = std::fs::read_to_string(path)?;
    format.parse(&contents)
}
