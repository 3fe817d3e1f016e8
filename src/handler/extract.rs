//! # Field Extraction
//!
//! Picks one field out of a JSON secret value.

use serde_json::Value;

/// Outcome of extracting a field from a raw value
#[derive(Debug)]
pub enum FieldExtraction {
    /// Field present; strings are returned as-is, other values as compact JSON
    Found(String),
    /// Value parsed but has no such field, or the field is null
    Missing,
    /// Value is not JSON
    NotJson(serde_json::Error),
}

impl FieldExtraction {
    /// The extracted value, if any
    pub fn into_value(self) -> Option<String> {
        match self {
            FieldExtraction::Found(value) => Some(value),
            FieldExtraction::Missing | FieldExtraction::NotJson(_) => None,
        }
    }
}

/// Parse `raw` as JSON and extract `field`
///
/// Objects are indexed by key, arrays by a decimal index.
pub fn extract_field(raw: &str, field: &str) -> FieldExtraction {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(parsed) => parsed,
        Err(e) => return FieldExtraction::NotJson(e),
    };

    let selected = match &parsed {
        Value::Object(fields) => fields.get(field),
        Value::Array(items) => field.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    };

    match selected {
        None | Some(Value::Null) => FieldExtraction::Missing,
        Some(Value::String(value)) => FieldExtraction::Found(value.clone()),
        Some(other) => FieldExtraction::Found(other.to_string()),
    }
}
