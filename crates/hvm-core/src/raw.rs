//! Raw per-environment values
//!
//! Values stored for an environment are either literals or secret
//! references. [`RawValue`] tags the two apart once, at decode time, so the
//! validator and the generator match on a variant instead of sniffing the
//! shape of a mapping again.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as JsonValue};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::schema::ValueType;
use crate::secrets::SecretRef;

/// Longest rendering of a structured value in listings
const DISPLAY_WIDTH: usize = 50;

/// A value as stored in an environment's values document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<JsonValue>),
    Object(Map<String, JsonValue>),
    Secret(SecretRef),
}

impl From<JsonValue> for RawValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => RawValue::Null,
            JsonValue::Bool(b) => RawValue::Bool(b),
            JsonValue::Number(n) => RawValue::Number(n),
            JsonValue::String(s) => RawValue::String(s),
            JsonValue::Array(items) => RawValue::Array(items),
            JsonValue::Object(map) => match SecretRef::from_map(map) {
                Ok(secret) => RawValue::Secret(secret),
                Err(map) => RawValue::Object(map),
            },
        }
    }
}

impl From<RawValue> for JsonValue {
    fn from(value: RawValue) -> Self {
        match value {
            RawValue::Null => JsonValue::Null,
            RawValue::Bool(b) => JsonValue::Bool(b),
            RawValue::Number(n) => JsonValue::Number(n),
            RawValue::String(s) => JsonValue::String(s),
            RawValue::Array(items) => JsonValue::Array(items),
            RawValue::Object(map) => JsonValue::Object(map),
            RawValue::Secret(secret) => JsonValue::Object(secret.into_map()),
        }
    }
}

impl From<SecretRef> for RawValue {
    fn from(secret: SecretRef) -> Self {
        RawValue::Secret(secret)
    }
}

impl RawValue {
    /// Check the value against a declared type
    ///
    /// A secret-shaped mapping is still a mapping, so it conforms to
    /// `object`.
    pub fn conforms_to(&self, value_type: ValueType) -> bool {
        match (self, value_type) {
            (RawValue::String(_), ValueType::String) => true,
            (RawValue::Number(_), ValueType::Number) => true,
            (RawValue::Bool(_), ValueType::Boolean) => true,
            (RawValue::Array(_), ValueType::Array) => true,
            (RawValue::Object(_) | RawValue::Secret(_), ValueType::Object) => true,
            _ => false,
        }
    }

    pub fn as_secret(&self) -> Option<&SecretRef> {
        match self {
            RawValue::Secret(secret) => Some(secret),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Convert back into an untyped JSON value
    pub fn to_json(&self) -> JsonValue {
        self.clone().into()
    }

    /// Short rendering for listings; environment references are masked
    pub fn display(&self) -> String {
        match self {
            RawValue::Secret(secret) if secret.is_env_reference() => {
                format!("[SECRET - {}]", secret.label())
            }
            RawValue::String(s) => s.clone(),
            RawValue::Array(_) | RawValue::Object(_) | RawValue::Secret(_) => {
                truncate(&self.to_json().to_string(), DISPLAY_WIDTH)
            }
            other => other.to_json().to_string(),
        }
    }

    /// Parse command-line input according to the declared type
    ///
    /// - `number`: integer unless the input contains a `.`
    /// - `boolean`: `true/yes/y/1` or `false/no/n/0`, case-insensitive
    /// - `array`: a JSON array, or comma-separated strings
    /// - `object`: a JSON object
    pub fn parse_as(input: &str, value_type: ValueType) -> Result<Self> {
        match value_type {
            ValueType::String => Ok(RawValue::String(input.to_string())),
            ValueType::Number => parse_number(input).map(RawValue::Number),
            ValueType::Boolean => match input.to_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Ok(RawValue::Bool(true)),
                "false" | "no" | "n" | "0" => Ok(RawValue::Bool(false)),
                _ => Err(CoreError::ValueParse {
                    message: format!("Invalid boolean: {}", input),
                }),
            },
            ValueType::Array => match serde_json::from_str::<JsonValue>(input) {
                Ok(JsonValue::Array(items)) => Ok(RawValue::Array(items)),
                _ => Ok(RawValue::Array(
                    input
                        .split(',')
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .map(|item| JsonValue::String(item.to_string()))
                        .collect(),
                )),
            },
            ValueType::Object => match serde_json::from_str::<JsonValue>(input) {
                Ok(value @ JsonValue::Object(_)) => Ok(RawValue::from(value)),
                _ => Err(CoreError::ValueParse {
                    message: format!("Invalid JSON object: {}", input),
                }),
            },
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn parse_number(input: &str) -> Result<Number> {
    let invalid = || CoreError::ValueParse {
        message: format!("Invalid number: {}", input),
    };
    if input.contains('.') {
        let parsed: f64 = input.parse().map_err(|_| invalid())?;
        Number::from_f64(parsed).ok_or_else(invalid)
    } else {
        let parsed: i64 = input.parse().map_err(|_| invalid())?;
        Ok(Number::from(parsed))
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width - 3).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mapping_with_type_field_is_secret() {
        let value = RawValue::from(json!({"type": "env", "name": "DB_PW"}));
        assert!(value.as_secret().is_some());

        let value = RawValue::from(json!({"host": "localhost"}));
        assert!(matches!(value, RawValue::Object(_)));
    }

    #[test]
    fn test_secret_roundtrips_losslessly() {
        let original = json!({"type": "ClusterIP", "port": 80});
        let value: RawValue = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(serde_json::to_value(&value).unwrap(), original);
    }

    #[test]
    fn test_conforms_to() {
        assert!(RawValue::from(json!(3)).conforms_to(ValueType::Number));
        assert!(!RawValue::from(json!(true)).conforms_to(ValueType::Number));
        assert!(!RawValue::from(json!("8080")).conforms_to(ValueType::Number));
        assert!(RawValue::from(json!(true)).conforms_to(ValueType::Boolean));
        assert!(RawValue::from(json!(["a"])).conforms_to(ValueType::Array));
        assert!(RawValue::from(json!({"type": "ClusterIP"})).conforms_to(ValueType::Object));
        assert!(!RawValue::Null.conforms_to(ValueType::String));
    }

    #[test]
    fn test_display_masks_env_references() {
        let value = RawValue::from(json!({"type": "env", "name": "API_KEY"}));
        assert_eq!(value.display(), "[SECRET - API_KEY]");
    }

    #[test]
    fn test_display_truncates_long_structures() {
        let value = RawValue::from(json!(["a-very-long-item-name", "another-long-item-name", "third"]));
        let shown = value.display();
        assert_eq!(shown.chars().count(), DISPLAY_WIDTH);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(RawValue::parse_as("3", ValueType::Number).unwrap(), RawValue::from(json!(3)));
        assert_eq!(RawValue::parse_as("0.5", ValueType::Number).unwrap(), RawValue::from(json!(0.5)));
        assert!(RawValue::parse_as("three", ValueType::Number).is_err());
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(RawValue::parse_as("Yes", ValueType::Boolean).unwrap(), RawValue::Bool(true));
        assert_eq!(RawValue::parse_as("0", ValueType::Boolean).unwrap(), RawValue::Bool(false));
        let err = RawValue::parse_as("maybe", ValueType::Boolean).unwrap_err();
        assert_eq!(err.to_string(), "Invalid boolean: maybe");
    }

    #[test]
    fn test_parse_array() {
        assert_eq!(
            RawValue::parse_as(r#"[1, "two"]"#, ValueType::Array).unwrap(),
            RawValue::from(json!([1, "two"]))
        );
        assert_eq!(
            RawValue::parse_as("a, b,,c ", ValueType::Array).unwrap(),
            RawValue::from(json!(["a", "b", "c"]))
        );
    }

    #[test]
    fn test_parse_object() {
        assert_eq!(
            RawValue::parse_as(r#"{"cpu": "100m"}"#, ValueType::Object).unwrap(),
            RawValue::from(json!({"cpu": "100m"}))
        );
        assert!(RawValue::parse_as("[1]", ValueType::Object).is_err());
    }
}
