//! Configuration Loader
//!
//! [`ConfigLoader`] dispatches every layer descriptor of a `load` call to its
//! source concurrently, waits for all of them, deep-merges the successful
//! ones in submission order and validates the result against the optional
//! JSON schema.
//!
//! ## Events
//!
//! ```text
//! layer_load_start         published in submission order, before any source runs
//! layer_load_stop / error  published as each source settles
//! layer_url_attempt_error  published by the url source after a failed try
//! ```
//!
//! A descriptor with an unknown `type` gets an immediate error result and no
//! event at all.
//!
//! ## Failure
//!
//! `load` fails only when every layer failed ([`LoadError::Layer`]) or when
//! the merged configuration does not satisfy the schema
//! ([`LoadError::JsonSchema`]). Individual layer failures are otherwise
//! reported through [`ConfigLoader::layers_in_error`].

pub mod events;
pub mod merge;
mod options;

pub use events::{EventBus, LoaderEvent};
pub use merge::{merge_all, merge_maps, merge_values};
pub use options::LoaderOptions;

use futures::future::{self, BoxFuture, FutureExt, join_all};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::constants::{events as event_constants, messages};
use crate::schema::SchemaValidator;
use crate::source::{
    EnvSnapshot, EnvironmentSource, FileSource, JsonDbSource, ObjectSource, ReqwestHttpClient,
    SharedHttpClient, SourceContext, SourceRegistry, UrlSource,
};
use crate::storage::{
    FormatFileLoader, SharedFileLoader, SharedRecordStoreFactory, SqliteStoreFactory,
};
use crate::types::{LayerDescriptor, LayerResult, LoadError, Result, get_path};

// =============================================================================
// Builder
// =============================================================================

/// Builds a [`ConfigLoader`] with custom collaborators
pub struct ConfigLoaderBuilder {
    options: LoaderOptions,
    http_client: Option<SharedHttpClient>,
    file_loader: Option<SharedFileLoader>,
    record_stores: Option<SharedRecordStoreFactory>,
    event_capacity: usize,
}

impl Default for ConfigLoaderBuilder {
    fn default() -> Self {
        Self {
            options: LoaderOptions::default(),
            http_client: None,
            file_loader: None,
            record_stores: None,
            event_capacity: event_constants::CHANNEL_CAPACITY,
        }
    }
}

impl ConfigLoaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn http_client(mut self, client: SharedHttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn file_loader(mut self, loader: SharedFileLoader) -> Self {
        self.file_loader = Some(loader);
        self
    }

    pub fn record_store_factory(mut self, factory: SharedRecordStoreFactory) -> Self {
        self.record_stores = Some(factory);
        self
    }

    /// Capacity of the event channel (per subscriber backlog)
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Compile the schema and wire every source.
    ///
    /// Fails on an invalid schema or invalid url timings.
    pub fn build(self) -> Result<ConfigLoader> {
        let validator = SchemaValidator::compile(self.options.jsonschema.as_ref())?;
        let timings = self.options.timings()?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => Arc::new(ReqwestHttpClient::new()?),
        };
        let file_loader = self
            .file_loader
            .unwrap_or_else(|| Arc::new(FormatFileLoader));
        let record_stores = self
            .record_stores
            .unwrap_or_else(|| Arc::new(SqliteStoreFactory));
        let base_dir = self.options.base_dir.clone();

        let mut registry = SourceRegistry::new();
        registry
            .register(Arc::new(ObjectSource))
            .register(Arc::new(EnvironmentSource))
            .register(Arc::new(FileSource::new(file_loader, base_dir.clone())))
            .register(Arc::new(JsonDbSource::new(record_stores, base_dir)))
            .register(Arc::new(UrlSource::new(http_client, timings)));

        debug!(
            "ConfigLoader ready (schema: {}, sources: {:?})",
            validator.is_enabled(),
            registry.kinds()
        );

        Ok(ConfigLoader {
            options: self.options,
            validator,
            registry,
            events: EventBus::with_capacity(self.event_capacity),
            layers: Vec::new(),
            config: Value::Object(Map::new()),
        })
    }
}

// =============================================================================
// Loader
// =============================================================================

#[derive(Debug)]
pub struct ConfigLoader {
    options: LoaderOptions,
    validator: SchemaValidator,
    registry: SourceRegistry,
    events: EventBus,
    layers: Vec<LayerResult>,
    config: Value,
}

impl ConfigLoader {
    /// Loader with the default collaborators
    pub fn new(options: LoaderOptions) -> Result<Self> {
        Self::builder().options(options).build()
    }

    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder::new()
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Receive lifecycle events. Subscribe before calling `load`.
    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.events.subscribe()
    }

    /// Load `descriptors` against the current process environment.
    pub async fn load(&mut self, descriptors: &[LayerDescriptor]) -> std::result::Result<(), LoadError> {
        self.load_with_env(descriptors, EnvSnapshot::capture()).await
    }

    /// Load `descriptors` against an explicit environment snapshot.
    #[instrument(skip_all, fields(layers = descriptors.len()))]
    pub async fn load_with_env(
        &mut self,
        descriptors: &[LayerDescriptor],
        env: EnvSnapshot,
    ) -> std::result::Result<(), LoadError> {
        let ctx = SourceContext::new(env, self.events.clone());

        // Start events go out here, in order, while the futures are built
        let pending: Vec<BoxFuture<'_, LayerResult>> = descriptors
            .iter()
            .map(|descriptor| self.dispatch(descriptor, &ctx))
            .collect();
        let results = join_all(pending).await;

        self.layers = results;
        let failed = self.layers.iter().filter(|layer| layer.is_error()).count();
        info!(
            "Loaded {} layer(s), {} in error",
            self.layers.len() - failed,
            failed
        );

        if failed == self.layers.len() {
            return Err(LoadError::Layer {
                details: self.layers_in_error(),
            });
        }

        let merged = merge_all(self.layers.iter().filter_map(LayerResult::config));

        if let Err(violations) = self.validator.validate(&merged) {
            warn!("Merged configuration violates the schema ({} error(s))", violations.len());
            return Err(LoadError::JsonSchema {
                details: violations,
            });
        }

        self.config = merged;
        Ok(())
    }

    fn dispatch<'a>(
        &'a self,
        descriptor: &'a LayerDescriptor,
        ctx: &'a SourceContext,
    ) -> BoxFuture<'a, LayerResult> {
        let Some(source) = self.registry.get(&descriptor.layer_kind()) else {
            debug!("No source for layer {}", descriptor.label());
            return future::ready(LayerResult::invalid(descriptor, messages::TYPE_INCORRECT))
                .boxed();
        };

        self.events
            .publish(LoaderEvent::LayerLoadStart(descriptor.clone()));

        async move {
            let result = source.load(descriptor, ctx).await;
            match result.error() {
                Some(error) => warn!("Layer {} failed: {}", descriptor.label(), error),
                None => debug!("Layer {} loaded", descriptor.label()),
            }
            self.events.publish(LoaderEvent::completed(result.clone()));
            result
        }
        .boxed()
    }

    // =========================================================================
    // Queries over the last load
    // =========================================================================

    /// True when at least one layer of the last load failed
    pub fn has_layers_in_error(&self) -> bool {
        self.layers.iter().any(LayerResult::is_error)
    }

    /// Failed layers of the last load, in submission order
    pub fn layers_in_error(&self) -> Vec<LayerResult> {
        self.layers
            .iter()
            .filter(|layer| layer.is_error())
            .cloned()
            .collect()
    }

    /// Every layer result of the last load, in submission order
    pub fn layers(&self) -> &[LayerResult] {
        &self.layers
    }

    /// Merged configuration of the last successful load
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// Copy of the value at `path`, or `default` when the path is absent.
    pub fn get_value(&self, path: &str, default: Value) -> Value {
        get_path(&self.config, path).cloned().unwrap_or(default)
    }

    /// Typed read of the value at `path`. `None` when absent or of another
    /// shape.
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let value = get_path(&self.config, path)?;
        serde_json::from_value(value.clone()).ok()
    }
}
