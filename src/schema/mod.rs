//! Schema Validator Adapter
//!
//! Wraps the `jsonschema` engine behind a compile-once / validate / violation
//! list contract. Absence of a schema disables validation entirely.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{ConfstackError, Result, pointer_to_data_path};

/// One schema violation found in the merged configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// Data path into the configuration (`.option1`, `.list[0]`)
    pub path: String,
    /// Violated constraint keyword (`type`, `required`, ...)
    pub keyword: String,
    pub message: String,
    /// `{<keyword>: <constraint value>}` as written in the schema
    pub params: Value,
}

/// Compiled schema, or a pass-through when no schema was supplied
pub struct SchemaValidator {
    compiled: Option<Compiled>,
}

struct Compiled {
    schema: Value,
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl SchemaValidator {
    /// Compile `schema` once. A non-object schema counts as absent.
    pub fn compile(schema: Option<&Value>) -> Result<Self> {
        let Some(schema) = schema.filter(|s| s.is_object()) else {
            return Ok(Self::disabled());
        };

        let validator = jsonschema::validator_for(schema)
            .map_err(|e| ConfstackError::Schema(e.to_string()))?;
        debug!("JSON schema compiled");

        Ok(Self {
            compiled: Some(Compiled {
                schema: schema.clone(),
                validator,
            }),
        })
    }

    pub fn disabled() -> Self {
        Self { compiled: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.compiled.is_some()
    }

    /// Validate `config`, reporting every violation.
    pub fn validate(&self, config: &Value) -> std::result::Result<(), Vec<SchemaViolation>> {
        let Some(compiled) = &self.compiled else {
            return Ok(());
        };

        let violations: Vec<SchemaViolation> = compiled
            .validator
            .iter_errors(config)
            .map(|error| {
                let schema_path = error.schema_path.to_string();
                let keyword = schema_path
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                let params = constraint_params(&compiled.schema, &schema_path, &keyword);

                SchemaViolation {
                    path: pointer_to_data_path(&error.instance_path.to_string()),
                    keyword,
                    message: error.to_string(),
                    params,
                }
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Look up the constraint value at `schema_path` and wrap it under `keyword`.
fn constraint_params(schema: &Value, schema_path: &str, keyword: &str) -> Value {
    let mut params = Map::new();
    if let Some(constraint) = schema.pointer(schema_path) {
        params.insert(keyword.to_string(), constraint.clone());
    }
    Value::Object(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn option1_schema() -> Value {
        json!({
            "title": "test",
            "description": "json schema de test",
            "type": "object",
            "properties": {
                "option1": {"type": "string"}
            }
        })
    }

    #[test]
    fn test_no_schema_is_always_valid() {
        let validator = SchemaValidator::compile(None).unwrap();
        assert!(!validator.is_enabled());
        assert!(validator.validate(&json!({"anything": 1})).is_ok());
    }

    #[test]
    fn test_valid_config() {
        let validator = SchemaValidator::compile(Some(&option1_schema())).unwrap();
        assert!(validator.validate(&json!({"option1": "1"})).is_ok());
    }

    #[test]
    fn test_type_violation() {
        let validator = SchemaValidator::compile(Some(&option1_schema())).unwrap();
        let violations = validator.validate(&json!({"option1": 1})).unwrap_err();

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, ".option1");
        assert_eq!(violations[0].keyword, "type");
        assert_eq!(violations[0].params, json!({"type": "string"}));
        assert!(!violations[0].message.is_empty());
    }

    #[test]
    fn test_reports_all_violations() {
        let schema = json!({
            "type": "object",
            "properties": {
                "a": {"type": "string"},
                "b": {"type": "integer", "minimum": 10}
            },
            "required": ["c"]
        });
        let validator = SchemaValidator::compile(Some(&schema)).unwrap();
        let violations = validator
            .validate(&json!({"a": 1, "b": 2}))
            .unwrap_err();

        let keywords: Vec<&str> = violations.iter().map(|v| v.keyword.as_str()).collect();
        assert_eq!(violations.len(), 3);
        assert!(keywords.contains(&"type"));
        assert!(keywords.contains(&"minimum"));
        assert!(keywords.contains(&"required"));
    }

    #[test]
    fn test_invalid_schema_fails_compilation() {
        let schema = json!({"type": 12});
        let err = SchemaValidator::compile(Some(&schema)).unwrap_err();
        assert!(matches!(err, ConfstackError::Schema(_)));
    }
}
