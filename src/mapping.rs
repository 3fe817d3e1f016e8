//! # Deep Value Mapping
//!
//! Walks a nested JSON value and transforms every leaf, keeping the shape.
//!
//! Objects and arrays are structure; strings, numbers, booleans and null are
//! leaves. The transform may return any value, so a leaf can become a
//! structure in the result.

use serde_json::{Map, Value};

/// Placeholder written in place of every redacted leaf
pub const REDACTED: &str = "*****";

/// Return a copy of `value` with `transform` applied to every leaf
pub fn map_values_deep<F>(value: &Value, transform: &mut F) -> Value
where
    F: FnMut(&Value) -> Value,
{
    match value {
        Value::Object(fields) => {
            let mapped: Map<String, Value> = fields
                .iter()
                .map(|(key, field)| (key.clone(), map_values_deep(field, transform)))
                .collect();
            Value::Object(mapped)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| map_values_deep(item, transform))
                .collect(),
        ),
        leaf => transform(leaf),
    }
}

/// Replace every leaf with [`REDACTED`], keeping keys visible for logging
pub fn redact_leaves(value: &Value) -> Value {
    map_values_deep(value, &mut |_| Value::String(REDACTED.to_string()))
}
