//! Layer Sources
//!
//! Defines the [`LayerSource`] trait: one implementation per layer kind, each
//! turning a descriptor into a [`LayerResult`]. A source never fails: every
//! problem is reported through the result's error.
//!
//! ## Modules
//!
//! - `object`: configuration given inline
//! - `environment`: environment variables mapped onto paths
//! - `file`: JSON / YAML / TOML documents on disk
//! - `json_db`: one record of a record store
//! - `url`: remote JSON document with retry and global timeout
//! - `http`: HTTP client used by the url source
//! - `timing`: durations of the url retry/timeout race

mod environment;
mod file;
mod http;
mod json_db;
mod object;
mod timing;
mod url;

pub use environment::{EnvSnapshot, EnvironmentSource};
pub use file::FileSource;
pub use http::{HttpClient, HttpError, HttpResponse, ReqwestHttpClient, SharedHttpClient};
pub use json_db::JsonDbSource;
pub use object::ObjectSource;
pub use timing::{HttpTimings, with_attempt_timeout};
pub use url::UrlSource;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::loader::EventBus;
use crate::types::{LayerDescriptor, LayerKind, LayerResult};

/// Per-call context handed to every source
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Environment captured when the load call started
    pub env: Arc<EnvSnapshot>,
    /// Publishing side of the loader's event channel
    pub events: EventBus,
}

impl SourceContext {
    pub fn new(env: EnvSnapshot, events: EventBus) -> Self {
        Self {
            env: Arc::new(env),
            events,
        }
    }
}

/// Loads one kind of layer
#[async_trait]
pub trait LayerSource: Send + Sync {
    /// Kind handled by this source
    fn kind(&self) -> LayerKind;

    /// Load a layer. Always resolves to a result, never panics on bad input.
    async fn load(&self, descriptor: &LayerDescriptor, ctx: &SourceContext) -> LayerResult;
}

/// Shared source type for concurrent dispatch.
pub type SharedSource = Arc<dyn LayerSource>;

/// Maps each layer kind to its source. `LayerKind::Unknown` is never
/// registered, so unknown kinds always resolve to no source.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    sources: HashMap<LayerKind, SharedSource>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` under its kind, replacing any previous one.
    pub fn register(&mut self, source: SharedSource) -> &mut Self {
        let kind = source.kind();
        if !matches!(kind, LayerKind::Unknown(_)) {
            self.sources.insert(kind, source);
        }
        self
    }

    pub fn get(&self, kind: &LayerKind) -> Option<&SharedSource> {
        match kind {
            LayerKind::Unknown(_) => None,
            known => self.sources.get(known),
        }
    }

    pub fn kinds(&self) -> Vec<LayerKind> {
        LayerKind::KNOWN
            .into_iter()
            .filter(|kind| self.sources.contains_key(kind))
            .collect()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(ObjectSource));

        assert!(registry.get(&LayerKind::Object).is_some());
        assert!(registry.get(&LayerKind::Url).is_none());
        assert!(registry.get(&LayerKind::Unknown("object".into())).is_none());
        assert_eq!(registry.kinds(), vec![LayerKind::Object]);
    }
}
