//! Lifecycle Events
//!
//! Loader events are published on a `tokio::sync::broadcast` channel.
//! Subscribers must subscribe before calling `load`; events published with
//! no live receiver are dropped.

use tokio::sync::broadcast;
use tracing::trace;

use crate::constants::events as event_constants;
use crate::types::{Attempt, LayerDescriptor, LayerResult};

/// Event published by the loader while processing layers
#[derive(Debug, Clone)]
pub enum LoaderEvent {
    /// A layer is about to be dispatched to its source
    LayerLoadStart(LayerDescriptor),
    /// A layer finished with a configuration
    LayerLoadStop(LayerResult),
    /// A layer finished with an error
    LayerLoadError(LayerResult),
    /// One url attempt failed; the source will retry unless timed out
    LayerUrlAttemptError {
        descriptor: LayerDescriptor,
        attempt: Attempt,
    },
}

impl LoaderEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Self::LayerLoadStart(_) => event_constants::LAYER_LOAD_START,
            Self::LayerLoadStop(_) => event_constants::LAYER_LOAD_STOP,
            Self::LayerLoadError(_) => event_constants::LAYER_LOAD_ERROR,
            Self::LayerUrlAttemptError { .. } => event_constants::LAYER_URL_ATTEMPT_ERROR,
        }
    }

    /// Completion event matching a finished result
    pub fn completed(result: LayerResult) -> Self {
        if result.is_error() {
            Self::LayerLoadError(result)
        } else {
            Self::LayerLoadStop(result)
        }
    }
}

/// Cloneable publishing side of the event channel
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LoaderEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(event_constants::CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: LoaderEvent) {
        let name = event.name();
        if self.sender.send(event).is_err() {
            trace!("No subscriber for event {}", name);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LayerError;
    use serde_json::{Map, json};

    #[test]
    fn test_event_names() {
        let descriptor = LayerDescriptor::url("http://host.domain.tld/config");
        assert_eq!(
            LoaderEvent::LayerLoadStart(descriptor.clone()).name(),
            "layer_load_start"
        );
        assert_eq!(
            LoaderEvent::LayerUrlAttemptError {
                descriptor,
                attempt: Attempt::transport("boom"),
            }
            .name(),
            "layer_url_attempt_error"
        );
    }

    #[test]
    fn test_completed_picks_stop_or_error() {
        let ok = LayerResult::loaded(LayerDescriptor::object(json!({})), Map::new());
        assert_eq!(LoaderEvent::completed(ok).name(), "layer_load_stop");

        let failed = LayerResult::failed(LayerDescriptor::new("file"), LayerError::new("x"));
        assert_eq!(LoaderEvent::completed(failed).name(), "layer_load_error");
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(LoaderEvent::LayerLoadStart(LayerDescriptor::new("object")));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "layer_load_start");
    }

    #[test]
    fn test_publish_without_subscriber_is_silent() {
        let bus = EventBus::new();
        bus.publish(LoaderEvent::LayerLoadStart(LayerDescriptor::new("object")));
    }
}
