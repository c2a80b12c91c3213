//! Url source: fetches a remote JSON document.
//!
//! Two branches race for the result:
//!
//! - the **timeout** branch sleeps for the layer budget, raises the shared
//!   timed-out flag and fails the layer with every attempt recorded so far;
//! - the **retry** task issues GET requests one after another, recording each
//!   failure as an [`Attempt`] and publishing `layer_url_attempt_error`, until
//!   one succeeds.
//!
//! The retry task is detached, not aborted: a request in flight when the
//! budget expires runs to completion and its result is discarded. The flag is
//! checked after each retry delay, before the next request. It is raised
//! when the budget expires and when the `load` future is dropped early.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::http::SharedHttpClient;
use super::timing::{HttpTimings, with_attempt_timeout};
use super::{LayerSource, SourceContext};
use crate::constants::messages;
use crate::loader::{EventBus, LoaderEvent};
use crate::types::{
    Attempt, LayerDescriptor, LayerError, LayerKind, LayerResult, format_seconds,
};

type SharedAttempts = Arc<Mutex<Vec<Attempt>>>;

pub struct UrlSource {
    client: SharedHttpClient,
    timings: HttpTimings,
}

impl UrlSource {
    pub fn new(client: SharedHttpClient, timings: HttpTimings) -> Self {
        Self { client, timings }
    }
}

fn valid_url(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
}

/// Raises the timed-out flag when the `load` future goes away, whether it
/// settled or was dropped by its caller.
struct RaiseOnDrop(Arc<AtomicBool>);

impl Drop for RaiseOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// State moved into the detached retry task
struct RetryLoop {
    client: SharedHttpClient,
    url: String,
    timings: HttpTimings,
    descriptor: LayerDescriptor,
    events: EventBus,
    attempts: SharedAttempts,
    timed_out: Arc<AtomicBool>,
}

impl RetryLoop {
    /// Request until success. `None` once the timed-out flag is raised.
    async fn run(self) -> Option<Map<String, Value>> {
        loop {
            let outcome = with_attempt_timeout(
                self.timings.request,
                self.client.get(&self.url, self.timings.request),
            )
            .await;

            let attempt = match outcome {
                Ok(response) => match response.data {
                    Value::Object(config) => return Some(config),
                    data => Attempt::response(
                        messages::RESPONSE_NOT_OBJECT,
                        response.status,
                        data,
                        response.headers,
                    ),
                },
                Err(e) => e.into_attempt(),
            };

            warn!("Attempt on {} failed: {}", self.url, attempt.message);
            self.attempts.lock().await.push(attempt.clone());
            self.events.publish(LoaderEvent::LayerUrlAttemptError {
                descriptor: self.descriptor.clone(),
                attempt,
            });

            tokio::time::sleep(self.timings.retry_delay).await;
            if self.timed_out.load(Ordering::SeqCst) {
                debug!("Retry loop on {} stopped after timeout", self.url);
                return None;
            }
        }
    }
}

#[async_trait]
impl LayerSource for UrlSource {
    fn kind(&self) -> LayerKind {
        LayerKind::Url
    }

    async fn load(&self, descriptor: &LayerDescriptor, ctx: &SourceContext) -> LayerResult {
        let Some(url) = valid_url(descriptor.field("url")) else {
            return LayerResult::invalid(descriptor, messages::URL_INVALID);
        };

        let attempts: SharedAttempts = Arc::new(Mutex::new(Vec::new()));
        let timed_out = Arc::new(AtomicBool::new(false));
        let _stop_retries = RaiseOnDrop(Arc::clone(&timed_out));

        let retry = tokio::spawn(
            RetryLoop {
                client: Arc::clone(&self.client),
                url: url.to_string(),
                timings: self.timings,
                descriptor: descriptor.clone(),
                events: ctx.events.clone(),
                attempts: Arc::clone(&attempts),
                timed_out: Arc::clone(&timed_out),
            }
            .run(),
        );

        let outcome = tokio::select! {
            joined = retry => match joined {
                Ok(Some(config)) => Ok(config),
                Ok(None) => Err(self.timeout_error()),
                Err(e) => Err(LayerError::new(e.to_string())),
            },
            _ = tokio::time::sleep(self.timings.total) => {
                timed_out.store(true, Ordering::SeqCst);
                warn!("Url layer {} timed out", url);
                Err(self.timeout_error())
            }
        };

        let recorded = attempts.lock().await.clone();
        let result = match outcome {
            Ok(config) => LayerResult::loaded(descriptor.clone(), config),
            Err(error) => LayerResult::failed(descriptor.clone(), error),
        };
        result.with_attempts(recorded)
    }
}

impl UrlSource {
    fn timeout_error(&self) -> LayerError {
        LayerError::new(format!(
            "le délai de {}s a expiré",
            format_seconds(self.timings.total_secs)
        ))
    }
}
