//! Loader Event Reporting
//!
//! Streams [`LoaderEvent`]s from the loader's broadcast channel to the
//! console while a load runs, and keeps a per-kind tally for the final
//! summary line. Detached url retry tasks may keep the channel open after
//! `load` returns, so the reporter is stopped explicitly.

use console::style;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::loader::LoaderEvent;

/// Event counts of one load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSummary {
    pub started: usize,
    pub loaded: usize,
    pub failed: usize,
    pub attempt_errors: usize,
    /// Events lost because the reporter fell behind
    pub missed: u64,
}

impl EventSummary {
    pub fn record(&mut self, event: &LoaderEvent) {
        match event {
            LoaderEvent::LayerLoadStart(_) => self.started += 1,
            LoaderEvent::LayerLoadStop(_) => self.loaded += 1,
            LoaderEvent::LayerLoadError(_) => self.failed += 1,
            LoaderEvent::LayerUrlAttemptError { .. } => self.attempt_errors += 1,
        }
    }
}

/// Renders events as single console lines
pub struct EventReporter {
    quiet: bool,
}

impl EventReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// One line per event
    pub fn render(event: &LoaderEvent) -> String {
        match event {
            LoaderEvent::LayerLoadStart(descriptor) => {
                format!("{} {}", style("→").cyan(), descriptor.label())
            }
            LoaderEvent::LayerLoadStop(result) => {
                let keys = result.config().map(|config| config.len()).unwrap_or(0);
                format!(
                    "{} {} ({} key(s))",
                    style("✓").green(),
                    result.descriptor.label(),
                    keys
                )
            }
            LoaderEvent::LayerLoadError(result) => format!(
                "{} {}: {}",
                style("✗").red(),
                result.descriptor.label(),
                result
                    .error()
                    .map(|error| error.message.as_str())
                    .unwrap_or_default()
            ),
            LoaderEvent::LayerUrlAttemptError {
                descriptor,
                attempt,
            } => format!(
                "{} {}: {}",
                style("↻").yellow(),
                descriptor.label(),
                attempt.message
            ),
        }
    }

    fn emit(&self, summary: &mut EventSummary, event: &LoaderEvent) {
        summary.record(event);
        if !self.quiet {
            eprintln!("  {}", Self::render(event));
        }
    }

    /// Print events from `receiver` to stderr until [`ReporterHandle::finish`]
    /// is called or the channel closes.
    pub fn spawn(self, mut receiver: broadcast::Receiver<LoaderEvent>) -> ReporterHandle {
        let (stop, mut stopped) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut summary = EventSummary::default();
            loop {
                tokio::select! {
                    biased;
                    received = receiver.recv() => match received {
                        Ok(event) => self.emit(&mut summary, &event),
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            debug!("Event reporter lagged by {} event(s)", missed);
                            summary.missed += missed;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = &mut stopped => {
                        while let Ok(event) = receiver.try_recv() {
                            self.emit(&mut summary, &event);
                        }
                        break;
                    }
                }
            }
            summary
        });

        ReporterHandle { stop, task }
    }
}

/// Running reporter task
pub struct ReporterHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<EventSummary>,
}

impl ReporterHandle {
    /// Flush pending events and return the tally
    pub async fn finish(self) -> EventSummary {
        // The task may already be gone if the channel closed
        let _ = self.stop.send(());
        self.task.await.unwrap_or_default()
    }
}
