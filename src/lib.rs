//! confstack - Layered Runtime Configuration
//!
//! Assembles one configuration object from an ordered list of layers:
//! inline objects, environment variables, JSON / YAML / TOML files, records
//! of a keyed store and remote HTTP documents.
//!
//! ## Core Features
//!
//! - **Concurrent loading**: every layer of a load runs at the same time
//! - **Partial failure**: a load succeeds as long as one layer succeeds
//! - **Deep merge**: later layers override earlier ones, objects merge recursively
//! - **Schema validation**: optional JSON schema over the merged result
//! - **Lifecycle events**: broadcast per layer start, stop, error and url retry
//! - **Url retry race**: a bounded budget raced against a sequential retry loop
//!
//! ## Quick Start
//!
//! ```ignore
//! use confstack::{ConfigLoader, LayerDescriptor, LoaderOptions};
//! use serde_json::json;
//!
//! let mut loader = ConfigLoader::new(LoaderOptions::default())?;
//! loader
//!     .load(&[
//!         LayerDescriptor::object(json!({"option1": "value1"})),
//!         LayerDescriptor::file("config.yaml"),
//!         LayerDescriptor::url("https://config.example.com/app"),
//!     ])
//!     .await?;
//!
//! let value = loader.get_value("option1", json!("default"));
//! ```
//!
//! ## Modules
//!
//! - [`loader`]: orchestration, merge, events
//! - [`source`]: one source per layer kind
//! - [`schema`]: JSON schema adapter
//! - [`storage`]: file loader and record store collaborators
//! - [`config`]: settings of the `confstack` tool
//! - [`cli`]: command implementations

pub mod cli;
pub mod config;
pub mod constants;
pub mod loader;
pub mod schema;
pub mod source;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use loader::{ConfigLoader, ConfigLoaderBuilder, EventBus, LoaderEvent, LoaderOptions};

// Error Types
pub use types::error::{ConfstackError, LoadError, LoadErrorKind, Result, ResultExt};

// Layer Model
pub use types::{Attempt, LayerDescriptor, LayerError, LayerKind, LayerOutcome, LayerResult};

// =============================================================================
// Collaborator Re-exports
// =============================================================================

pub use schema::{SchemaValidator, SchemaViolation};
pub use source::{EnvSnapshot, HttpClient, HttpError, HttpResponse, LayerSource, SourceContext};
pub use storage::{FileLoader, RecordStore, RecordStoreFactory, SqliteRecordStore};

// Settings
pub use config::{Settings, SettingsLoader};
