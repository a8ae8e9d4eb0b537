//! Schema model for configuration values
//!
//! A schema is a version tag plus an ordered list of [`SchemaValue`]
//! declarations. Loading a schema document fails fast on the first
//! structural problem; cross-entry problems such as duplicate keys are left
//! for the validator so that a broken schema can still be reported in full.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// The only schema version understood by this crate
pub const SUPPORTED_VERSION: &str = "1.0";

/// Declared type of a schema value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ValueType {
    pub const ALL: [ValueType; 5] = [
        ValueType::String,
        ValueType::Number,
        ValueType::Boolean,
        ValueType::Array,
        ValueType::Object,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
            ValueType::Object => "object",
        }
    }

    /// Parse a type name, returning `None` for anything outside the five kinds
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Check whether a plain JSON value conforms to this type
    ///
    /// Booleans are never numbers, and `null` conforms to nothing.
    pub fn accepts(&self, value: &JsonValue) -> bool {
        match self {
            ValueType::String => value.is_string(),
            ValueType::Number => value.is_number(),
            ValueType::Boolean => value.is_boolean(),
            ValueType::Array => value.is_array(),
            ValueType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            let names: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
            format!("invalid type '{}', expected one of: {}", s, names.join(", "))
        })
    }
}

/// One declared configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaValue {
    /// Stable identifier, independent of where the value is rendered
    pub key: String,

    /// Dot-separated destination in the rendered values document
    pub path: String,

    pub description: String,

    #[serde(rename = "type")]
    pub value_type: ValueType,

    pub required: bool,

    /// Fallback used during generation when an environment sets nothing
    pub default: Option<JsonValue>,

    /// Sensitive values must be secret references, never literals
    pub sensitive: bool,
}

impl SchemaValue {
    /// Create a required, non-sensitive value without a default
    pub fn new(
        key: impl Into<String>,
        path: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
            description: String::new(),
            value_type,
            required: true,
            default: None,
            sensitive: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = if default.is_null() { None } else { Some(default) };
        self
    }

    pub fn with_sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = sensitive;
        self
    }

    /// Build an entry from an untyped document node
    fn from_json(index: usize, node: &JsonValue) -> Result<Self> {
        let obj = node.as_object().ok_or_else(|| CoreError::InvalidSchema {
            message: format!("values[{}] must be an object", index),
        })?;

        let key = string_field(obj, index, "key", None)?;
        let label = Some(key.as_str());
        let path = string_field(obj, index, "path", label)?;
        let description = string_field(obj, index, "description", label)?;

        let value_type = match obj.get("type") {
            None => {
                return Err(CoreError::MissingField {
                    field: format!("values[{}].type", index),
                });
            }
            Some(JsonValue::String(name)) => {
                ValueType::parse(name).ok_or_else(|| CoreError::InvalidSchema {
                    message: format!("Invalid type for {}: {}", key, name),
                })?
            }
            Some(other) => {
                return Err(CoreError::InvalidSchema {
                    message: format!("Invalid type for {}: {}", key, other),
                });
            }
        };

        let required = bool_field(obj, "required", &key, true)?;
        let sensitive = bool_field(obj, "sensitive", &key, false)?;
        let default = obj.get("default").filter(|v| !v.is_null()).cloned();

        Ok(Self {
            key,
            path,
            description,
            value_type,
            required,
            default,
            sensitive,
        })
    }
}

fn string_field(
    obj: &Map<String, JsonValue>,
    index: usize,
    field: &str,
    key: Option<&str>,
) -> Result<String> {
    match obj.get(field) {
        None | Some(JsonValue::Null) => Err(CoreError::MissingField {
            field: format!("values[{}].{}", index, field),
        }),
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(_) => Err(CoreError::InvalidSchema {
            message: match key {
                Some(key) => format!("Field '{}' of {} must be a string", field, key),
                None => format!("Field 'values[{}].{}' must be a string", index, field),
            },
        }),
    }
}

fn bool_field(obj: &Map<String, JsonValue>, field: &str, key: &str, default: bool) -> Result<bool> {
    match obj.get(field) {
        None => Ok(default),
        Some(JsonValue::Bool(b)) => Ok(*b),
        Some(_) => Err(CoreError::InvalidSchema {
            message: format!("Field '{}' of {} must be a boolean", field, key),
        }),
    }
}

/// Check that a path is made of non-empty segments of alphanumerics,
/// hyphens and underscores
pub fn is_valid_path(path: &str) -> bool {
    !path.is_empty()
        && path.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        })
}

/// Partial update applied by [`Schema::update`]
///
/// `default: Some(None)` clears the default.
#[derive(Debug, Clone, Default)]
pub struct SchemaUpdate {
    pub path: Option<String>,
    pub description: Option<String>,
    pub value_type: Option<ValueType>,
    pub required: Option<bool>,
    pub default: Option<Option<JsonValue>>,
    pub sensitive: Option<bool>,
}

/// Configuration schema document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JsonValue")]
pub struct Schema {
    pub version: String,
    pub values: Vec<SchemaValue>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            version: SUPPORTED_VERSION.to_string(),
            values: Vec::new(),
        }
    }
}

impl TryFrom<JsonValue> for Schema {
    type Error = CoreError;

    fn try_from(document: JsonValue) -> Result<Self> {
        let obj = document.as_object().ok_or_else(|| CoreError::InvalidSchema {
            message: "schema document must be a JSON object".to_string(),
        })?;

        let version = match obj.get("version") {
            None => SUPPORTED_VERSION.to_string(),
            Some(JsonValue::String(v)) => v.clone(),
            Some(other) => {
                return Err(CoreError::InvalidSchema {
                    message: format!("version must be a string, got {}", other),
                });
            }
        };

        let values = match obj.get("values") {
            None => Vec::new(),
            Some(JsonValue::Array(entries)) => entries
                .iter()
                .enumerate()
                .map(|(index, node)| SchemaValue::from_json(index, node))
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(CoreError::InvalidSchema {
                    message: "values must be an array".to_string(),
                });
            }
        };

        Ok(Self { version, values })
    }
}

impl Schema {
    /// Create an empty schema at the supported version
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a schema document from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::SchemaNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let schema = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            entries = schema.values.len(),
            "loaded schema"
        );
        Ok(schema)
    }

    /// Parse a schema from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let document: JsonValue = serde_json::from_str(json)?;
        Self::try_from(document)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the schema to disk
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut content = self.to_json()?;
        content.push('\n');
        std::fs::write(path, content)?;
        tracing::debug!(path = %path.display(), "saved schema");
        Ok(())
    }

    /// Find a value by key
    pub fn get(&self, key: &str) -> Option<&SchemaValue> {
        self.values.iter().find(|v| v.key == key)
    }

    /// Lookup table by key; with duplicate keys the last declaration wins
    pub fn by_key(&self) -> HashMap<&str, &SchemaValue> {
        self.values.iter().map(|v| (v.key.as_str(), v)).collect()
    }

    /// Append a new value declaration
    pub fn add(&mut self, value: SchemaValue) -> Result<()> {
        if self.get(&value.key).is_some() {
            return Err(CoreError::DuplicateKey { key: value.key });
        }
        if !is_valid_path(&value.path) {
            return Err(CoreError::InvalidPath { path: value.path });
        }
        check_default(&value)?;
        self.values.push(value);
        Ok(())
    }

    /// Remove a value declaration by key
    pub fn remove(&mut self, key: &str) -> Result<SchemaValue> {
        let index = self.position(key)?;
        Ok(self.values.remove(index))
    }

    /// Apply a partial update to an existing declaration
    ///
    /// Changing the type drops a default that no longer conforms, unless the
    /// update supplies a new default.
    pub fn update(&mut self, key: &str, update: SchemaUpdate) -> Result<&SchemaValue> {
        let index = self.position(key)?;
        let mut value = self.values[index].clone();

        if let Some(path) = update.path {
            if !is_valid_path(&path) {
                return Err(CoreError::InvalidPath { path });
            }
            value.path = path;
        }
        if let Some(description) = update.description {
            value.description = description;
        }
        if let Some(value_type) = update.value_type {
            if value_type != value.value_type {
                value.value_type = value_type;
                if value.default.as_ref().is_some_and(|d| !value_type.accepts(d)) {
                    value.default = None;
                }
            }
        }
        if let Some(required) = update.required {
            value.required = required;
        }
        if let Some(default) = update.default {
            value.default = default.filter(|d| !d.is_null());
        }
        if let Some(sensitive) = update.sensitive {
            value.sensitive = sensitive;
        }

        check_default(&value)?;
        self.values[index] = value;
        Ok(&self.values[index])
    }

    fn position(&self, key: &str) -> Result<usize> {
        self.values
            .iter()
            .position(|v| v.key == key)
            .ok_or_else(|| CoreError::KeyNotFound {
                key: key.to_string(),
            })
    }
}

fn check_default(value: &SchemaValue) -> Result<()> {
    match &value.default {
        Some(default) if !value.value_type.accepts(default) => Err(CoreError::InvalidSchema {
            message: format!("Default value type mismatch for {}", value.key),
        }),
        _ => Ok(()),
    }
}
