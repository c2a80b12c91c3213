//! Settings Management
//!
//! Settings of the `confstack` tool with hierarchical resolution:
//! 1. Built-in defaults
//! 2. User settings (`<config dir>/confstack/settings.toml`)
//! 3. Project settings (`./confstack.toml`)
//! 4. Explicit `--settings` file
//! 5. Environment variables (`CONFSTACK_*`)

mod loader;
mod types;

pub use loader::{SettingsLoader, SettingsSource};
pub use types::Settings;
