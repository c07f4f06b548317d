// src/models/record.rs

//! Loosely structured deal records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single deal record as returned by the CRM.
///
/// Field names and nesting drift between Imoview tenants and API
/// revisions, so no fixed schema is enforced. The record keeps the raw
/// JSON object and exposes lookup helpers that treat absent or mistyped
/// fields as `None`, never as errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap a raw JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Whether the field exists at all, regardless of its value.
    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Raw field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Field value as a non-empty string.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// First non-empty string value among the candidate fields, in order.
    pub fn first_text(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// Field value of a nested object, as a non-empty string.
    pub fn nested_text(&self, object_key: &str, field: &str) -> Option<&str> {
        self.0
            .get(object_key)?
            .as_object()?
            .get(field)?
            .as_str()
            .filter(|s| !s.is_empty())
    }

    /// Elements of an array field, or an empty slice when the field is
    /// missing or not an array.
    pub fn entries(&self, key: &str) -> &[Value] {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Identifier used in log lines. Falls back to `"unknown"` when the
    /// record carries no usable `codigo` field.
    pub fn display_id(&self) -> String {
        match self.0.get("codigo") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "unknown".to_string(),
        }
    }
}
