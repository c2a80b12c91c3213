//! Load Command
//!
//! Read layer descriptors from a file, run one load and print the merged
//! configuration.
//!
//! Usage:
//!   confstack load layers.yaml [--schema schema.json] [-f json|yaml]
//!   confstack load layers.json --get option2.cle1 --default '"fallback"'
//!
//! The layers file is either a list of descriptors or an object with a
//! `layers` list (the only shape TOML allows).

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::progress::EventReporter;
use crate::cli::ui::Output;
use crate::config::SettingsLoader;
use crate::loader::ConfigLoader;
use crate::storage::FileFormat;
use crate::types::{ConfstackError, LayerDescriptor, Result};

/// Options of `confstack load`
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub layers: PathBuf,
    pub schema: Option<PathBuf>,
    pub format: String,
    pub get: Option<String>,
    pub default: Option<String>,
    pub settings: Option<PathBuf>,
    pub quiet: bool,
}

pub async fn run(options: LoadOptions) -> Result<()> {
    let output = Output::quiet(options.quiet);

    let mut settings = SettingsLoader::new().load(options.settings.as_deref())?;
    if let Some(schema) = &options.schema {
        settings.schema_file = Some(schema.clone());
    }
    if settings.base_dir.is_none() {
        settings.base_dir = options.layers.parent().map(Path::to_path_buf);
    }

    let descriptors = read_layers(&options.layers)?;
    info!(
        "Loading {} layer(s) from {}",
        descriptors.len(),
        options.layers.display()
    );

    let mut loader = ConfigLoader::new(settings.to_loader_options()?)?;
    let reporter = EventReporter::new(options.quiet).spawn(loader.subscribe());

    let outcome = loader.load(&descriptors).await;
    let summary = reporter.finish().await;

    if let Err(error) = outcome {
        output.error(&error.to_string());
        eprintln!("{}", serde_json::to_string_pretty(&error.to_value())?);
        return Err(error.into());
    }

    let value = match &options.get {
        Some(path) => loader.get_value(path, parse_default(options.default.as_deref())),
        None => loader.config().clone(),
    };
    output.result(&render(&value, &options.format)?);

    for layer in loader.layers_in_error() {
        let message = layer
            .error()
            .map(|error| error.message.clone())
            .unwrap_or_default();
        output.warning(&format!("{}: {}", layer.descriptor.label(), message));
    }
    let in_error = loader.layers_in_error().len();
    output.success(&format!(
        "{} layer(s) loaded, {} in error, {} failed url attempt(s)",
        loader.layers().len() - in_error,
        in_error,
        summary.attempt_errors
    ));

    Ok(())
}

/// Parse the layers file
pub fn read_layers(path: &Path) -> Result<Vec<LayerDescriptor>> {
    let format = FileFormat::from_path(path).ok_or_else(|| {
        ConfstackError::Config(format!("unsupported layers file: {}", path.display()))
    })?;
    let contents = std::fs::read_to_string(path)?;

    let layers = match format.parse(&contents)? {
        Value::Object(mut document) => document.remove("layers").ok_or_else(|| {
            ConfstackError::Config("layers file must contain a 'layers' list".to_string())
        })?,
        other => other,
    };

    Ok(serde_json::from_value(layers)?)
}

/// `--default` is JSON when it parses, a plain string otherwise
fn parse_default(raw: Option<&str>) -> Value {
    match raw {
        None => Value::Null,
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

fn render(value: &Value, format: &str) -> Result<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(value)?),
        "yaml" => Ok(serde_yaml::to_string(value)?),
        other => Err(ConfstackError::Config(format!(
            "Invalid format '{}'. Valid values: json, yaml",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_read_layers_yaml_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layers.yaml");
        std::fs::write(
            &path,
            "- type: object\n  config: {option1: value1}\n- type: file\n  file: conf.json\n",
        )
        .unwrap();

        let layers = read_layers(&path).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1], LayerDescriptor::file("conf.json"));
    }

    #[test]
    fn test_read_layers_toml_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layers.toml");
        std::fs::write(
            &path,
            "[[layers]]\ntype = \"url\"\nurl = \"http://host/config\"\n",
        )
        .unwrap();

        let layers = read_layers(&path).unwrap();
        assert_eq!(layers, vec![LayerDescriptor::url("http://host/config")]);
    }

    #[test]
    fn test_read_layers_rejects_object_without_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layers.json");
        std::fs::write(&path, r#"{"type": "object"}"#).unwrap();
        assert!(read_layers(&path).is_err());
    }

    #[test]
    fn test_parse_default() {
        assert_eq!(parse_default(None), Value::Null);
        assert_eq!(parse_default(Some("12")), json!(12));
        assert_eq!(parse_default(Some(r#"{"a":1}"#)), json!({"a": 1}));
        assert_eq!(parse_default(Some("fallback")), json!("fallback"));
    }

    #[test]
    fn test_render_formats() {
        let value = json!({"a": 1});
        assert_eq!(render(&value, "yaml").unwrap(), "a: 1\n");
        assert!(render(&value, "json").unwrap().contains("\"a\": 1"));
        assert!(render(&value, "xml").is_err());
    }
}
