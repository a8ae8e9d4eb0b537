//! Secret references
//!
//! A secret reference is a mapping with a `type` field that stands in for a
//! value held elsewhere:
//!
//! ```json
//! { "type": "env", "name": "DB_PASSWORD" }
//! ```
//!
//! Only the `env` source is supported. References are checked structurally
//! during validation and resolved to their actual value only at generation
//! time.

use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use thiserror::Error;

/// `type` tag of environment-variable references
pub const ENV_SECRET_TYPE: &str = "env";

/// Errors raised while checking or resolving a secret reference
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("invalid secret structure")]
    InvalidStructure,

    #[error("Unsupported secret type: {kind}")]
    Unsupported { kind: String },

    #[error("Environment variable '{name}' is not set")]
    EnvironmentLookup { name: String },
}

/// Where secret values are looked up
pub trait EnvSource {
    /// Return the variable's value, or `None` when it is not set
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the current process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// A validated secret source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    Env { name: String },
}

impl SecretSource {
    /// Look the secret up; an unset variable is a hard failure
    pub fn resolve(&self, env: &dyn EnvSource) -> Result<String, SecretError> {
        match self {
            SecretSource::Env { name } => {
                env.var(name).ok_or_else(|| SecretError::EnvironmentLookup { name: name.clone() })
            }
        }
    }

    /// Whether the secret currently has a non-empty value
    pub fn is_available(&self, env: &dyn EnvSource) -> bool {
        match self {
            SecretSource::Env { name } => env.var(name).is_some_and(|v| !v.is_empty()),
        }
    }
}

/// A mapping recognized as a secret reference
///
/// The decoded mapping is kept as-is so that re-encoding is lossless, even
/// for references that do not pass [`SecretRef::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct SecretRef {
    fields: Map<String, JsonValue>,
}

impl SecretRef {
    /// Build an environment-variable reference
    pub fn env(name: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("type".into(), JsonValue::String(ENV_SECRET_TYPE.into()));
        fields.insert("name".into(), JsonValue::String(name.into()));
        Self { fields }
    }

    /// Recognize a mapping as a secret reference
    ///
    /// Any mapping carrying a `type` field qualifies; anything else is handed
    /// back unchanged.
    pub fn from_map(fields: Map<String, JsonValue>) -> Result<Self, Map<String, JsonValue>> {
        if fields.contains_key("type") {
            Ok(Self { fields })
        } else {
            Err(fields)
        }
    }

    /// The raw `type` field
    pub fn kind(&self) -> &JsonValue {
        self.fields.get("type").unwrap_or(&JsonValue::Null)
    }

    /// The raw `name` field, if any
    pub fn name(&self) -> Option<&JsonValue> {
        self.fields.get("name")
    }

    /// Loose recognition used for masking: `type == "env"` with a `name`
    pub fn is_env_reference(&self) -> bool {
        self.kind().as_str() == Some(ENV_SECRET_TYPE) && self.fields.contains_key("name")
    }

    /// Human readable label of the referenced secret, never its value
    pub fn label(&self) -> String {
        match self.name() {
            Some(JsonValue::String(name)) => name.clone(),
            Some(other) => other.to_string(),
            None => display_kind(self.kind()),
        }
    }

    /// Strict structural check
    pub fn validate(&self) -> Result<SecretSource, SecretError> {
        match self.kind() {
            JsonValue::String(kind) if kind == ENV_SECRET_TYPE => match self.name() {
                Some(JsonValue::String(name)) => Ok(SecretSource::Env { name: name.clone() }),
                _ => Err(SecretError::InvalidStructure),
            },
            other => Err(SecretError::Unsupported {
                kind: display_kind(other),
            }),
        }
    }

    /// Validate and resolve in one step
    pub fn resolve(&self, env: &dyn EnvSource) -> Result<String, SecretError> {
        self.validate()?.resolve(env)
    }

    pub fn into_map(self) -> Map<String, JsonValue> {
        self.fields
    }
}

fn display_kind(kind: &JsonValue) -> String {
    match kind {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
