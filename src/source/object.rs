//! Object source: the configuration is given inline in `config`.

use async_trait::async_trait;
use serde_json::Value;

use super::{LayerSource, SourceContext};
use crate::constants::messages;
use crate::types::{LayerDescriptor, LayerKind, LayerResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectSource;

#[async_trait]
impl LayerSource for ObjectSource {
    fn kind(&self) -> LayerKind {
        LayerKind::Object
    }

    async fn load(&self, descriptor: &LayerDescriptor, _ctx: &SourceContext) -> LayerResult {
        match descriptor.field("config") {
            Some(Value::Object(config)) => LayerResult::loaded(descriptor.clone(), config.clone()),
            _ => LayerResult::invalid(descriptor, messages::CONFIG_NOT_OBJECT),
        }
    }
}
