//! Environment source: maps environment variables onto configuration paths.
//!
//! Each `mapping` entry is either a path string or `{path, type}`:
//!
//! ```yaml
//! mapping:
//!   CONFIG_OPTION1: option6
//!   CONFIG_BOOL: { path: option7, type: boolean }
//!   CONFIG_NUMBER: { path: option8, type: number }
//! ```
//!
//! Values are read from the [`EnvSnapshot`] captured when the load started.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

use super::{LayerSource, SourceContext};
use crate::constants::messages;
use crate::types::{LayerDescriptor, LayerKind, LayerResult, set_path};

// =============================================================================
// Environment Snapshot
// =============================================================================

/// Immutable copy of the process environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment. Variables whose name or value
    /// is not valid unicode are skipped.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// =============================================================================
// Coercion
// =============================================================================

/// Target type of one mapping entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coercion {
    Boolean,
    Number,
    Raw,
}

impl Coercion {
    fn from_type(name: Option<&str>) -> Self {
        match name {
            Some("boolean") => Self::Boolean,
            Some("number") => Self::Number,
            _ => Self::Raw,
        }
    }

    /// `None` when the raw value cannot be coerced
    fn apply(self, raw: &str) -> Option<Value> {
        match self {
            Self::Boolean => Some(Value::Bool(parse_bool(raw))),
            Self::Number => parse_number(raw),
            Self::Raw => Some(Value::String(raw.to_string())),
        }
    }
}

/// `"true"`, `"on"` and `"1"` are true; anything else is false.
pub(crate) fn parse_bool(raw: &str) -> bool {
    matches!(raw, "true" | "on" | "1")
}

/// Parse a finite number. Blank input is `0`; `0x`, `0o` and `0b` prefixes
/// select an unsigned radix; integral values become JSON integers.
pub(crate) fn parse_number(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(Value::from(0));
    }

    // f64 parsing accepts "inf" and "NaN"; only finite values are numbers
    let number = match parse_radix(trimmed) {
        Some(number) => number,
        None => trimmed.parse::<f64>().ok()?,
    };
    if !number.is_finite() {
        return None;
    }
    if number.fract() == 0.0 && number.abs() < 9_007_199_254_740_992.0 {
        Some(Value::from(number as i64))
    } else {
        serde_json::Number::from_f64(number).map(Value::Number)
    }
}

/// `0x1F`, `0o17`, `0b101`. `None` when there is no radix prefix; a prefix
/// followed by invalid digits yields NaN.
fn parse_radix(raw: &str) -> Option<f64> {
    let radix = match raw.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &raw[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }
    let value = digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    });
    Some(value.unwrap_or(f64::NAN))
}

// =============================================================================
// Source
// =============================================================================

/// One validated mapping entry
struct MappingEntry<'a> {
    variable: &'a str,
    path: &'a str,
    coercion: Coercion,
}

fn parse_mapping(mapping: &Map<String, Value>) -> Result<Vec<MappingEntry<'_>>, String> {
    mapping
        .iter()
        .map(|(variable, target)| {
            let (path, type_name) = match target {
                Value::String(path) => (path.as_str(), None),
                Value::Object(spec) => match spec.get("path").and_then(Value::as_str) {
                    Some(path) => (path, spec.get("type").and_then(Value::as_str)),
                    None => return Err(format!("'mapping.{}' n'est pas valide", variable)),
                },
                _ => return Err(format!("'mapping.{}' n'est pas valide", variable)),
            };
            Ok(MappingEntry {
                variable,
                path,
                coercion: Coercion::from_type(type_name),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentSource;

impl EnvironmentSource {
    /// Build the layer configuration from `env`.
    fn build(
        mapping: &Map<String, Value>,
        env: &EnvSnapshot,
    ) -> Result<Map<String, Value>, String> {
        let entries = parse_mapping(mapping)?;
        let mut config = Map::new();

        for entry in entries {
            let Some(raw) = env.get(entry.variable) else {
                continue;
            };
            let value = entry.coercion.apply(raw).ok_or_else(|| {
                format!(
                    "La variable d'environnement '{}' n'est pas un nombre ({})",
                    entry.variable, raw
                )
            })?;
            set_path(&mut config, entry.path, value);
        }

        Ok(config)
    }
}

#[async_trait]
impl LayerSource for EnvironmentSource {
    fn kind(&self) -> LayerKind {
        LayerKind::Environment
    }

    async fn load(&self, descriptor: &LayerDescriptor, ctx: &SourceContext) -> LayerResult {
        let Some(Value::Object(mapping)) = descriptor.field("mapping") else {
            return LayerResult::invalid(descriptor, messages::MAPPING_NOT_OBJECT);
        };

        match Self::build(mapping, &ctx.env) {
            Ok(config) => {
                debug!(
                    "Environment layer {} mapped {} value(s)",
                    descriptor.label(),
                    config.len()
                );
                LayerResult::loaded(descriptor.clone(), config)
            }
            Err(message) => LayerResult::invalid(descriptor, message),
        }
    }
}
