pub mod commands;
pub mod progress;
pub mod ui;

pub use progress::{EventReporter, EventSummary, ReporterHandle};
