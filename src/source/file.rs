//! File source: reads a configuration document through a [`FileLoader`].

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use super::{LayerSource, SourceContext};
use crate::constants::messages;
use crate::storage::{FormatFileLoader, SharedFileLoader, resolve_path};
use crate::types::{
    LayerDescriptor, LayerError, LayerKind, LayerResult, json_non_empty_str,
};

pub struct FileSource {
    loader: SharedFileLoader,
    base_dir: Option<PathBuf>,
}

impl FileSource {
    pub fn new(loader: SharedFileLoader, base_dir: Option<PathBuf>) -> Self {
        Self { loader, base_dir }
    }
}

impl Default for FileSource {
    fn default() -> Self {
        Self::new(Arc::new(FormatFileLoader), None)
    }
}

#[async_trait]
impl LayerSource for FileSource {
    fn kind(&self) -> LayerKind {
        LayerKind::File
    }

    async fn load(&self, descriptor: &LayerDescriptor, _ctx: &SourceContext) -> LayerResult {
        let Some(file) = json_non_empty_str(descriptor.field("file")) else {
            return LayerResult::invalid(descriptor, messages::FILE_INVALID);
        };

        let path = resolve_path(self.base_dir.as_deref(), file);
        debug!("Reading file layer {}", path.display());

        match self.loader.load(&path).await {
            Ok(config) => LayerResult::loaded(descriptor.clone(), config),
            Err(e) => LayerResult::failed(
                descriptor.clone(),
                LayerError::new(format!("Impossible de lire {}", file)).with_cause(e.to_string()),
            ),
        }
    }
}
