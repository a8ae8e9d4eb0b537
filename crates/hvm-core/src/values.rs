//! Rendered values tree
//!
//! [`Values`] is the nested document handed to Helm. It is built by setting
//! leaves at dot-separated paths; intermediate mappings are created on
//! demand and never left empty.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{CoreError, Result};

/// Nested values document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Default for Values {
    fn default() -> Self {
        Self::new()
    }
}

impl Values {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self(JsonValue::Object(Map::new()))
    }

    /// Set a value by dotted path (e.g., "image.tag")
    ///
    /// Fails when the path runs through an existing non-mapping value or
    /// lands on a leaf that is already set.
    pub fn set(&mut self, path: &str, value: JsonValue) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();
        set_nested(&mut self.0, &parts, value).map_err(|_| CoreError::PathConflict {
            path: path.to_string(),
        })
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }

    /// Serialize as a Helm values file
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.0)?)
    }
}

/// Marker for a path that cannot be set without clobbering existing data
struct Conflict;

fn set_nested(
    value: &mut JsonValue,
    path: &[&str],
    new_value: JsonValue,
) -> std::result::Result<(), Conflict> {
    let Some((key, remaining)) = path.split_first() else {
        *value = new_value;
        return Ok(());
    };

    let JsonValue::Object(map) = value else {
        return Err(Conflict);
    };

    if remaining.is_empty() {
        if map.contains_key(*key) {
            return Err(Conflict);
        }
        map.insert(key.to_string(), new_value);
        return Ok(());
    }

    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| JsonValue::Object(Map::new()));
    set_nested(entry, remaining, new_value)
}

fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let Some((key, remaining)) = path.split_first() else {
        return Some(value);
    };

    match value {
        JsonValue::Object(map) => map.get(*key).and_then(|v| get_nested(v, remaining)),
        _ => None,
    }
}
