//! Values generation
//!
//! Turns a schema and one environment's raw values into the nested
//! [`Values`] tree handed to Helm. Secret references on sensitive entries are
//! resolved here, and only here.

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::error::CoreError;
use crate::raw::RawValue;
use crate::schema::{Schema, SchemaValue};
use crate::secrets::{EnvSource, ProcessEnv, SecretError};
use crate::store::EnvironmentValues;
use crate::values::Values;

/// Fatal generation failure; no partial output is ever produced
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("Missing required values for environment '{}': {}", .environment, .paths.join(", "))]
    MissingRequired {
        environment: String,
        paths: Vec<String>,
    },

    #[error("Failed to resolve secret for {key}: {source}")]
    Secret {
        key: String,
        #[source]
        source: SecretError,
    },

    #[error("Path conflicts with an existing value: {path}")]
    PathConflict { path: String },
}

/// Builds the rendered values tree for one environment
pub struct Generator<'a> {
    env: &'a dyn EnvSource,
}

impl Default for Generator<'static> {
    fn default() -> Self {
        Self { env: &ProcessEnv }
    }
}

impl<'a> Generator<'a> {
    /// Generator resolving secrets through `env`
    pub fn new(env: &'a dyn EnvSource) -> Self {
        Self { env }
    }

    /// Generate the values tree
    ///
    /// Every schema entry is visited before failing, so a missing-required
    /// error lists all missing paths. When both missing values and another
    /// failure occur, the missing values are reported.
    pub fn generate(
        &self,
        schema: &Schema,
        environment: &str,
        values: &EnvironmentValues,
    ) -> Result<Values, GenerateError> {
        let mut output = Values::new();
        let mut missing = Vec::new();
        let mut failure: Option<GenerateError> = None;

        for entry in &schema.values {
            let Some(value) = effective_value(entry, values) else {
                if entry.required {
                    missing.push(entry.path.clone());
                }
                continue;
            };

            let value = match self.resolve(entry, value) {
                Ok(value) => value,
                Err(err) => {
                    failure.get_or_insert(err);
                    continue;
                }
            };

            if let Err(CoreError::PathConflict { path }) = output.set(&entry.path, value) {
                failure.get_or_insert(GenerateError::PathConflict { path });
            }
        }

        if !missing.is_empty() {
            return Err(GenerateError::MissingRequired {
                environment: environment.to_string(),
                paths: missing,
            });
        }
        if let Some(err) = failure {
            return Err(err);
        }

        tracing::debug!(
            environment,
            entries = schema.values.len(),
            "generated values"
        );
        Ok(output)
    }

    fn resolve(&self, entry: &SchemaValue, value: JsonValue) -> Result<JsonValue, GenerateError> {
        if !entry.sensitive {
            return Ok(value);
        }
        match RawValue::from(value) {
            RawValue::Secret(secret) => secret
                .resolve(self.env)
                .map(JsonValue::String)
                .map_err(|source| GenerateError::Secret {
                    key: entry.key.clone(),
                    source,
                }),
            literal => Ok(literal.to_json()),
        }
    }
}

/// The environment's value, else the schema default; `null` counts as absent
fn effective_value(entry: &SchemaValue, values: &EnvironmentValues) -> Option<JsonValue> {
    match values.get(&entry.key) {
        Some(value) if !value.is_null() => Some(value.to_json()),
        _ => entry.default.clone(),
    }
}

/// Generate with secrets read from the process environment
pub fn generate_values(
    schema: &Schema,
    environment: &str,
    values: &EnvironmentValues,
) -> Result<Values, GenerateError> {
    Generator::default().generate(schema, environment, values)
}
