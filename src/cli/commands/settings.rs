//! Settings Command
//!
//! Usage:
//!   confstack settings show [-f toml|json] [--settings FILE]
//!   confstack settings path [--settings FILE]

use std::path::Path;

use crate::cli::ui::Output;
use crate::config::SettingsLoader;
use crate::types::{ConfstackError, Result};

/// Show the effective settings
pub fn show(format: &str, explicit: Option<&Path>) -> Result<()> {
    let settings = SettingsLoader::new().load(explicit)?;

    let rendered = match format {
        "json" => serde_json::to_string_pretty(&settings)?,
        "toml" => toml::to_string_pretty(&settings)
            .map_err(|e| ConfstackError::Config(e.to_string()))?,
        other => {
            return Err(ConfstackError::Config(format!(
                "Invalid format '{}'. Valid values: toml, json",
                other
            )));
        }
    };

    Output::new().result(&rendered);
    Ok(())
}

/// Show where settings are read from
pub fn path(explicit: Option<&Path>) -> Result<()> {
    let loader = SettingsLoader::new();

    println!("Settings files (lowest to highest priority):");
    println!();
    let output = Output::new();
    for source in loader.sources(explicit) {
        output.path_entry(source.label, &source.path, source.exists);
    }
    if SettingsLoader::user_config_dir().is_none() {
        println!("  User:     (not available)");
    }
    println!();
    println!("  Environment: {}*", loader.env_prefix());
    Ok(())
}
