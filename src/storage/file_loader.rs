//! File Loader
//!
//! Reads a configuration document from disk. The format is chosen from the
//! file extension: `.json`, `.yaml` / `.yml`, `.toml`.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::constants::messages;
use crate::types::{ConfstackError, Result};

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Parse `contents` into a JSON value
    pub fn parse(self, contents: &str) -> Result<Value> {
        Ok(match self {
            Self::Json => serde_json::from_str(contents)?,
            Self::Yaml => serde_yaml::from_str(contents)?,
            Self::Toml => toml::from_str(contents)?,
        })
    }
}

/// Loads a configuration mapping from a path
#[async_trait]
pub trait FileLoader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Map<String, Value>>;
}

/// Shared file loader type.
pub type SharedFileLoader = Arc<dyn FileLoader>;

/// Default loader: JSON, YAML or TOML by extension
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatFileLoader;

#[async_trait]
impl FileLoader for FormatFileLoader {
    async fn load(&self, path: &Path) -> Result<Map<String, Value>> {
        let format = FileFormat::from_path(path).ok_or_else(|| {
            ConfstackError::Config(format!("unsupported file format: {}", path.display()))
        })?;

        let contents = tokio::fs::read_to_string(path).await?;
        debug!("Read {} bytes from {}", contents.len(), path.display());

        match format.parse(&contents)? {
            Value::Object(map) => Ok(map),
            _ => Err(ConfstackError::Config(messages::DOCUMENT_NOT_OBJECT.to_string())),
        }
    }
}
