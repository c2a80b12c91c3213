//! Settings Loader (Figment-based)
//!
//! Loads and merges the tool settings from:
//! 1. Built-in defaults (Serialized)
//! 2. User settings (`<config dir>/confstack/settings.toml`)
//! 3. Project settings (`./confstack.toml`)
//! 4. An explicit `--settings` file
//! 5. Environment variables (`CONFSTACK_*` prefix)

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::types::Settings;
use crate::constants::settings as settings_constants;
use crate::types::{ConfstackError, Result};

/// Where a settings layer is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSource {
    pub label: &'static str,
    pub path: PathBuf,
    pub exists: bool,
}

/// Settings loader
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    user_file: Option<PathBuf>,
    project_file: PathBuf,
    env_prefix: String,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::with_paths(
            Self::user_config_dir().map(|dir| dir.join(settings_constants::USER_FILE)),
            PathBuf::from(settings_constants::PROJECT_FILE),
        )
    }
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paths(user_file: Option<PathBuf>, project_file: PathBuf) -> Self {
        Self {
            user_file,
            project_file,
            env_prefix: settings_constants::ENV_PREFIX.to_string(),
        }
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Per-user configuration directory (`~/.config/confstack` on Linux)
    pub fn user_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "confstack").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Resolve settings: defaults → user → project → explicit → env vars
    pub fn load(&self, explicit: Option<&Path>) -> Result<Settings> {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));

        if let Some(user_file) = &self.user_file
            && user_file.exists()
        {
            debug!("Loading user settings from: {}", user_file.display());
            figment = figment.merge(Toml::file(user_file));
        }

        if self.project_file.exists() {
            debug!("Loading project settings from: {}", self.project_file.display());
            figment = figment.merge(Toml::file(&self.project_file));
        }

        if let Some(explicit) = explicit {
            if !explicit.exists() {
                return Err(ConfstackError::Config(format!(
                    "Settings file not found: {}",
                    explicit.display()
                )));
            }
            debug!("Loading settings from: {}", explicit.display());
            figment = figment.merge(Toml::file(explicit));
        }

        // CONFSTACK_HTTP_TIMEOUT_IN_S -> http_timeout_in_s
        figment = figment.merge(Env::prefixed(&self.env_prefix).lowercase(true));

        let settings: Settings = figment
            .extract()
            .map_err(|e| ConfstackError::Config(format!("Settings error: {}", e)))?;

        settings.validate()?;

        Ok(settings)
    }

    /// Settings files in merge order, with their existence
    pub fn sources(&self, explicit: Option<&Path>) -> Vec<SettingsSource> {
        let mut sources = Vec::new();
        if let Some(user_file) = &self.user_file {
            sources.push(SettingsSource {
                label: "User",
                path: user_file.clone(),
                exists: user_file.exists(),
            });
        }
        sources.push(SettingsSource {
            label: "Project",
            path: self.project_file.clone(),
            exists: self.project_file.exists(),
        });
        if let Some(explicit) = explicit {
            sources.push(SettingsSource {
                label: "Explicit",
                path: explicit.to_path_buf(),
                exists: explicit.exists(),
            });
        }
        sources
    }

    pub fn env_prefix(&self) -> &str {
        &self.env_prefix
    }
}
