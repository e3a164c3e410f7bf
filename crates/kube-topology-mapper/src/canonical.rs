//! Canonical text encoding for nested record fields.
//!
//! Every structured sub-field (labels, ports, conditions, ...) goes through
//! [`encode`], so unchanged state always encodes to the same bytes: object
//! keys are sorted at every depth and no whitespace is emitted.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::Result;

/// Encode `value` as compact JSON with object keys sorted at every depth.
///
/// # Errors
///
/// Returns `TopologyError::Serialization` if `value` cannot be represented
/// as JSON (e.g. a map with non-string keys).
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&sorted(value))?)
}

/// Encode an optional string map. Absent renders as `{}`.
///
/// # Errors
///
/// See [`encode`].
pub fn encode_object<V: Serialize>(map: Option<&BTreeMap<String, V>>) -> Result<String> {
    match map {
        Some(map) => encode(map),
        None => Ok("{}".to_string()),
    }
}

// serde_json's `preserve_order` feature may be enabled elsewhere in the
// dependency graph, so key order is fixed explicitly.
fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sorted(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}
