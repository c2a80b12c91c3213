//! Shared utility functions for JSON values.
//!
//! ## Path Addressing
//!
//! Paths use the dotted form `option2.cle1`, with bracketed indices for
//! arrays (`servers[0].host`). A numeric dotted segment also indexes an array
//! (`servers.0.host`).
//!
//! - `get_path` - read a nested value
//! - `set_path` - write a nested value, creating intermediate objects
//!
//! ## JSON Extraction Helpers
//!
//! - `json_non_empty_str` - a field that must be a non-empty string

use serde_json::{Map, Value};

// =============================================================================
// Path Addressing
// =============================================================================

/// One step of a parsed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Split a dotted/bracketed path into segments. Empty segments are dropped.
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        let mut rest = part;
        if let Some(open) = rest.find('[') {
            let (head, tail) = rest.split_at(open);
            if !head.is_empty() {
                segments.push(PathSegment::Key(head.to_string()));
            }
            rest = tail;
            while let Some(stripped) = rest.strip_prefix('[') {
                let Some(close) = stripped.find(']') else {
                    segments.push(PathSegment::Key(rest.to_string()));
                    rest = "";
                    break;
                };
                let inner = &stripped[..close];
                match inner.parse::<usize>() {
                    Ok(index) => segments.push(PathSegment::Index(index)),
                    Err(_) => segments.push(PathSegment::Key(
                        inner.trim_matches(|c| c == '"' || c == '\'').to_string(),
                    )),
                }
                rest = &stripped[close + 1..];
            }
            if !rest.is_empty() {
                segments.push(PathSegment::Key(rest.to_string()));
            }
        } else if !rest.is_empty() {
            segments.push(PathSegment::Key(rest.to_string()));
        }
    }
    segments
}

/// Read the value at `path`. An empty path addresses the root.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    parse_path(path)
        .iter()
        .try_fold(root, |current, segment| match (current, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map.get(key),
            (Value::Object(map), PathSegment::Index(index)) => map.get(&index.to_string()),
            (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
            (Value::Array(items), PathSegment::Key(key)) => {
                key.parse::<usize>().ok().and_then(|index| items.get(index))
            }
            _ => None,
        })
}

/// Write `value` at `path` inside `root`, creating (or replacing non-object)
/// intermediate nodes with objects. Every segment is treated as an object key.
pub fn set_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    let keys: Vec<String> = parse_path(path)
        .into_iter()
        .map(|segment| match segment {
            PathSegment::Key(key) => key,
            PathSegment::Index(index) => index.to_string(),
        })
        .collect();

    let Some((last, parents)) = keys.split_last() else {
        return;
    };

    let mut current = root;
    for key in parents {
        let slot = current
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(map) = slot else {
            return;
        };
        current = map;
    }
    current.insert(last.clone(), value);
}

/// Convert a JSON pointer (`/list/0/name`) into the dotted data-path form
/// (`.list[0].name`).
pub fn pointer_to_data_path(pointer: &str) -> String {
    pointer
        .split('/')
        .skip(1)
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .map(|token| match token.parse::<usize>() {
            Ok(index) => format!("[{}]", index),
            Err(_) => format!(".{}", token),
        })
        .collect()
}

// =============================================================================
// JSON Extraction Helpers
// =============================================================================

/// Extract a field that must be a non-empty string.
#[inline]
pub fn json_non_empty_str<'a>(value: Option<&'a Value>) -> Option<&'a str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Format a number of seconds the way it was configured (`180`, `0.2`).
pub fn format_seconds(seconds: f64) -> String {
    format!("{}", seconds)
}
