//! Coercion of controller JSON into the string-or-null shape used by every
//! outward record.
//!
//! Catalyst Center mixes integers, floats, booleans, epoch timestamps and
//! missing keys in the same field across releases. Tool hosts need a fixed
//! schema, so every field crossing the tool boundary goes through
//! [`normalize`] and comes out as `Some(String)` or `None`.

use serde_json::Value;

/// Map a JSON value to its canonical string form. `null` stays `None`.
///
/// Strings pass through untouched, numbers and booleans use their JSON
/// spelling, and arrays/objects are re-serialized compactly.
pub fn normalize(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Normalize `record[key]`, treating a missing key like `null`.
pub fn field(record: &Value, key: &str) -> Option<String> {
    record.get(key).and_then(normalize)
}

/// First non-null of several keys, normalized.
pub fn field_or(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| field(record, key))
}

/// Unwrap a `{"response": [...]}` envelope, or accept a bare list.
///
/// `null` (HTTP 204 / empty body) and a `null` envelope both mean "no
/// records". Returns `None` when the payload is neither shape.
pub fn unwrap_envelope(payload: Value) -> Option<Vec<Value>> {
    let inner = match payload {
        Value::Object(mut map) if map.contains_key("response") => {
            map.remove("response").unwrap_or(Value::Null)
        }
        other => other,
    };
    match inner {
        Value::Array(items) => Some(items),
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}

/// Extract a text payload (e.g. a device configuration) from a
/// `{"response": "..."}` envelope or a bare JSON string. Blank text counts
/// as absent.
pub fn unwrap_text(payload: Value) -> Option<String> {
    let inner = match payload {
        Value::Object(mut map) => map.remove("response")?,
        other => other,
    };
    match inner {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}
