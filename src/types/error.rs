//! Unified Error Type System
//!
//! Two families of errors live here:
//!
//! - **Layer errors** ([`LayerError`]): the failure of one layer. They are
//!   plain data carried inside a [`LayerResult`](super::LayerResult) and are
//!   never returned as `Err` from a source.
//! - **Load errors** ([`LoadError`]): the only two ways `ConfigLoader::load`
//!   can fail, each tagged with a wire kind (`layer` / `jsonschema`).
//!
//! [`ConfstackError`] is the crate-wide error for construction, settings,
//! collaborators and the CLI.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::layer::LayerResult;
use crate::schema::SchemaViolation;

// =============================================================================
// Layer Error
// =============================================================================

/// Failure of a single layer, kept as data inside its result.
///
/// Response details of failed requests live on the recorded
/// [`Attempt`](super::Attempt)s, not here.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct LayerError {
    /// Human-readable message (part of the observable contract)
    pub message: String,
    /// Underlying cause, when the failure wraps another error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl LayerError {
    /// Create a layer error from a message only
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

// =============================================================================
// Load Error (aggregate)
// =============================================================================

/// Wire kind of an aggregate load error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadErrorKind {
    /// Every layer failed
    #[serde(rename = "layer")]
    Layer,
    /// The merged configuration does not satisfy the schema
    #[serde(rename = "jsonschema")]
    JsonSchema,
}

impl LoadErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Layer => "layer",
            Self::JsonSchema => "jsonschema",
        }
    }
}

impl std::fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate failure of a `load` call.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// All layers failed; carries every failed result in submission order
    #[error("Tous les layers ont échoués")]
    Layer { details: Vec<LayerResult> },

    /// The merge succeeded but failed schema validation
    #[error("La configuration ne correspond pas au json schema")]
    JsonSchema { details: Vec<SchemaViolation> },
}

impl LoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            Self::Layer { .. } => LoadErrorKind::Layer,
            Self::JsonSchema { .. } => LoadErrorKind::JsonSchema,
        }
    }

    /// Number of entries in `details`
    pub fn detail_count(&self) -> usize {
        match self {
            Self::Layer { details } => details.len(),
            Self::JsonSchema { details } => details.len(),
        }
    }

    /// Render the error as `{message, type, details}`
    pub fn to_value(&self) -> Value {
        let details = match self {
            Self::Layer { details } => serde_json::to_value(details),
            Self::JsonSchema { details } => serde_json::to_value(details),
        }
        .unwrap_or(Value::Null);

        serde_json::json!({
            "message": self.to_string(),
            "type": self.kind().as_str(),
            "details": details,
        })
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfstackError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // -------------------------------------------------------------------------
    // Collaborator Errors
    // -------------------------------------------------------------------------
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid JSON schema: {0}")]
    Schema(String),

    #[error("Config error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Load Errors
    // -------------------------------------------------------------------------
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl ConfstackError {
    /// Error text without the category prefix (`store unavailable` rather
    /// than `Storage error: store unavailable`)
    pub fn detail(&self) -> String {
        match self {
            Self::Io(e) => e.to_string(),
            Self::Database(e) => e.to_string(),
            Self::Json(e) => e.to_string(),
            Self::Yaml(e) => e.to_string(),
            Self::Toml(e) => e.to_string(),
            Self::Http(message)
            | Self::Storage(message)
            | Self::Schema(message)
            | Self::Config(message) => message.clone(),
            Self::Load(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfstackError>;

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| ConfstackError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| ConfstackError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
