//! Layer Model
//!
//! A [`LayerDescriptor`] is what the caller submits; a [`LayerResult`] is the
//! descriptor after processing, carrying exactly one [`LayerOutcome`].

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::error::LayerError;

// =============================================================================
// Layer Kind
// =============================================================================

/// Source kind selected by a descriptor's `type` field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Object,
    Environment,
    File,
    JsonDb,
    Url,
    /// Any other (or missing) `type`; never dispatched to a source
    Unknown(String),
}

impl LayerKind {
    /// All dispatchable kinds
    pub const KNOWN: [LayerKind; 5] = [
        LayerKind::Object,
        LayerKind::Environment,
        LayerKind::File,
        LayerKind::JsonDb,
        LayerKind::Url,
    ];

    pub fn parse(name: &str) -> Self {
        match name {
            "object" => Self::Object,
            "environment" => Self::Environment,
            "file" => Self::File,
            "json-db" => Self::JsonDb,
            "url" => Self::Url,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Object => "object",
            Self::Environment => "environment",
            Self::File => "file",
            Self::JsonDb => "json-db",
            Self::Url => "url",
            Self::Unknown(name) => name,
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Layer Descriptor
// =============================================================================

/// Caller-supplied description of one layer.
///
/// Type-specific fields stay raw JSON so that a malformed descriptor becomes a
/// layer error instead of a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Free-form description, used only in diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LayerDescriptor {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    pub fn object(config: Value) -> Self {
        Self::new("object").with_field("config", config)
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self::new("file").with_field("file", Value::String(path.into()))
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::new("url").with_field("url", Value::String(url.into()))
    }

    pub fn environment(mapping: Value) -> Self {
        Self::new("environment").with_field("mapping", mapping)
    }

    pub fn json_db(file: impl Into<String>, id: impl Into<Value>) -> Self {
        Self::new("json-db")
            .with_field("file", Value::String(file.into()))
            .with_field("id", id.into())
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn layer_kind(&self) -> LayerKind {
        LayerKind::parse(self.kind.as_deref().unwrap_or_default())
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Short label for logs: `type` plus `desc` when present
    pub fn label(&self) -> String {
        let kind = self.kind.as_deref().unwrap_or("<none>");
        match &self.desc {
            Some(desc) => format!("{} ({})", kind, desc),
            None => kind.to_string(),
        }
    }
}

// =============================================================================
// Attempt
// =============================================================================

/// One failed network try recorded by the url source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
}

impl Attempt {
    /// Failure that produced no response (timeout, DNS, connection refused)
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            data: None,
            headers: None,
        }
    }

    /// Failure that carries an HTTP response
    pub fn response(
        message: impl Into<String>,
        status: u16,
        data: Value,
        headers: Map<String, Value>,
    ) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
            data: Some(data),
            headers: Some(headers),
        }
    }
}

// =============================================================================
// Layer Result
// =============================================================================

/// Outcome of one layer: a config mapping or an error, never both
#[derive(Debug, Clone, PartialEq)]
pub enum LayerOutcome {
    Loaded(Map<String, Value>),
    Failed(LayerError),
}

/// A descriptor after processing
#[derive(Debug, Clone, PartialEq)]
pub struct LayerResult {
    pub descriptor: LayerDescriptor,
    pub outcome: LayerOutcome,
    /// Per-try failures, url layers only
    pub attempts: Option<Vec<Attempt>>,
}

impl LayerResult {
    pub fn loaded(descriptor: LayerDescriptor, config: Map<String, Value>) -> Self {
        Self {
            descriptor,
            outcome: LayerOutcome::Loaded(config),
            attempts: None,
        }
    }

    pub fn failed(descriptor: LayerDescriptor, error: LayerError) -> Self {
        Self {
            descriptor,
            outcome: LayerOutcome::Failed(error),
            attempts: None,
        }
    }

    /// Shorthand for a failure carrying only a message
    pub fn invalid(descriptor: &LayerDescriptor, message: impl Into<String>) -> Self {
        Self::failed(descriptor.clone(), LayerError::new(message))
    }

    pub fn with_attempts(mut self, attempts: Vec<Attempt>) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, LayerOutcome::Failed(_))
    }

    pub fn config(&self) -> Option<&Map<String, Value>> {
        match &self.outcome {
            LayerOutcome::Loaded(config) => Some(config),
            LayerOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&LayerError> {
        match &self.outcome {
            LayerOutcome::Loaded(_) => None,
            LayerOutcome::Failed(error) => Some(error),
        }
    }

    pub fn attempts(&self) -> &[Attempt] {
        self.attempts.as_deref().unwrap_or_default()
    }
}

/// Serialized as the descriptor fields followed by `config` or `error`, then
/// `attempts` when recorded.
impl Serialize for LayerResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(kind) = &self.descriptor.kind {
            map.serialize_entry("type", kind)?;
        }
        if let Some(desc) = &self.descriptor.desc {
            map.serialize_entry("desc", desc)?;
        }
        for (key, value) in &self.descriptor.fields {
            let shadowed = match key.as_str() {
                "config" => !self.is_error(),
                "error" | "attempts" => true,
                _ => false,
            };
            if !shadowed {
                map.serialize_entry(key, value)?;
            }
        }
        match &self.outcome {
            LayerOutcome::Loaded(config) => map.serialize_entry("config", config)?,
            LayerOutcome::Failed(error) => map.serialize_entry("error", error)?,
        }
        if let Some(attempts) = &self.attempts {
            map.serialize_entry("attempts", attempts)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_layer_kind_parse() {
        assert_eq!(LayerKind::parse("json-db"), LayerKind::JsonDb);
        assert_eq!(LayerKind::parse("url"), LayerKind::Url);
        assert_eq!(
            LayerKind::parse("incorrect"),
            LayerKind::Unknown("incorrect".to_string())
        );
        for kind in LayerKind::KNOWN {
            assert_eq!(LayerKind::parse(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_descriptor_deserialize_keeps_raw_fields() {
        let descriptor: LayerDescriptor = serde_json::from_value(json!({
            "type": "object",
            "desc": "bad layer",
            "config": "incorrect",
        }))
        .unwrap();

        assert_eq!(descriptor.layer_kind(), LayerKind::Object);
        assert_eq!(descriptor.desc.as_deref(), Some("bad layer"));
        assert_eq!(descriptor.field("config"), Some(&json!("incorrect")));
    }

    #[test]
    fn test_descriptor_without_type_is_unknown() {
        let descriptor: LayerDescriptor =
            serde_json::from_value(json!({"config": {"a": 1}})).unwrap();
        assert_eq!(descriptor.layer_kind(), LayerKind::Unknown(String::new()));
        assert_eq!(descriptor.label(), "<none>");
    }

    #[test]
    fn test_result_serializes_flat() {
        let descriptor = LayerDescriptor::file("conf.json").with_desc("file layer");
        let mut config = Map::new();
        config.insert("a".to_string(), json!(1));
        let result = LayerResult::loaded(descriptor, config);

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"type": "file", "desc": "file layer", "file": "conf.json", "config": {"a": 1}})
        );
    }

    #[test]
    fn test_failed_result_keeps_descriptor_config() {
        let descriptor = LayerDescriptor::object(json!("incorrecte"));
        let result = LayerResult::invalid(&descriptor, "'config' n'est pas un object");

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["config"], "incorrecte");
        assert_eq!(value["error"]["message"], "'config' n'est pas un object");
        assert!(result.is_error());
        assert!(result.config().is_none());
    }

    #[test]
    fn test_attempt_shapes() {
        let transport = Attempt::transport("timeout of 100ms exceeded");
        assert_eq!(
            serde_json::to_value(&transport).unwrap(),
            json!({"message": "timeout of 100ms exceeded"})
        );

        let response = Attempt::response(
            "Request failed with status code 500",
            500,
            json!("1ere erreur"),
            Map::new(),
        );
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "message": "Request failed with status code 500",
                "status": 500,
                "data": "1ere erreur",
                "headers": {},
            })
        );
    }
}
