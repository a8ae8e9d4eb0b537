//! Schema and values validation
//!
//! The validator never stops at the first problem. Every check appends to a
//! [`ValidationReport`] so that a single run lists everything wrong with the
//! schema and with each environment's values. Warnings, such as a referenced
//! environment variable that is not set yet, are kept apart and never fail
//! validation.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::error::CoreError;
use crate::raw::RawValue;
use crate::schema::{is_valid_path, Schema, SchemaValue, SUPPORTED_VERSION};
use crate::secrets::{EnvSource, ProcessEnv, SecretError, SecretSource};
use crate::store::{EnvironmentValues, ValueStore};

/// Which document an error was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorContext {
    Schema,
    Values,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorContext::Schema => f.write_str("Schema"),
            ErrorContext::Values => f.write_str("Values"),
        }
    }
}

/// A single validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub context: ErrorContext,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

impl ValidationError {
    pub fn schema(message: impl Into<String>) -> Self {
        Self {
            context: ErrorContext::Schema,
            message: message.into(),
            env: None,
        }
    }

    pub fn values(message: impl Into<String>, env: Option<&str>) -> Self {
        Self {
            context: ErrorContext::Values,
            message: message.into(),
            env: env.map(str::to_string),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.env {
            Some(env) => write!(f, "[{}] {}: {}", env, self.context, self.message),
            None => write!(f, "{}: {}", self.context, self.message),
        }
    }
}

/// Non-fatal finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationWarning {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.env {
            Some(env) => write!(f, "[{}] {}", env, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Outcome of a validation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    /// Environments whose values were checked
    pub environments: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors attached to one environment
    pub fn errors_for<'a>(&'a self, env: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.errors
            .iter()
            .filter(move |e| e.env.as_deref() == Some(env))
    }

    fn error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    fn warn(&mut self, message: String, env: &str) {
        tracing::debug!(env, "{}", message);
        self.warnings.push(ValidationWarning {
            message,
            env: Some(env.to_string()),
        });
    }
}

/// Cross-checks a schema against environment values
pub struct Validator<'a> {
    env: &'a dyn EnvSource,
}

impl Default for Validator<'static> {
    fn default() -> Self {
        Self { env: &ProcessEnv }
    }
}

impl<'a> Validator<'a> {
    /// Validator reading secret availability from `env`
    pub fn new(env: &'a dyn EnvSource) -> Self {
        Self { env }
    }

    /// Check the schema itself: version, duplicates, path format, defaults
    pub fn check_schema(&self, schema: &Schema, report: &mut ValidationReport) {
        if schema.version != SUPPORTED_VERSION {
            report.error(ValidationError::schema(format!(
                "Unsupported version: {}",
                schema.version
            )));
        }

        let mut seen_keys: HashSet<&str> = HashSet::new();
        let mut seen_paths: HashSet<&str> = HashSet::new();

        for entry in &schema.values {
            if !seen_keys.insert(&entry.key) {
                report.error(ValidationError::schema(format!(
                    "Duplicate key: {}",
                    entry.key
                )));
            }

            if !seen_paths.insert(&entry.path) {
                report.error(ValidationError::schema(format!(
                    "Duplicate path: {}",
                    entry.path
                )));
            }

            if !is_valid_path(&entry.path) {
                report.error(ValidationError::schema(format!(
                    "Invalid path format: {}",
                    entry.path
                )));
            }

            if let Some(default) = &entry.default {
                if !entry.value_type.accepts(default) {
                    report.error(ValidationError::schema(format!(
                        "Default value type mismatch for {}",
                        entry.key
                    )));
                }
            }
        }
    }

    /// Check one environment's values against the schema
    ///
    /// `None` means the environment has no values document, which is not an
    /// error by itself.
    pub fn check_environment(
        &self,
        schema: &Schema,
        environment: &str,
        values: Option<&EnvironmentValues>,
        report: &mut ValidationReport,
    ) {
        report.environments.push(environment.to_string());
        let Some(values) = values else {
            tracing::debug!(environment, "no values to validate");
            return;
        };

        let declared = schema.by_key();

        for (key, value) in values.iter() {
            let Some(entry) = declared.get(key) else {
                report.error(ValidationError::values(
                    format!("Unknown key: {}", key),
                    Some(environment),
                ));
                continue;
            };

            if entry.sensitive {
                self.check_secret(entry, value, environment, report);
            } else if !value.conforms_to(entry.value_type) {
                report.error(ValidationError::values(
                    format!("Type mismatch for {}: expected {}", key, entry.value_type),
                    Some(environment),
                ));
            }
        }

        for entry in &schema.values {
            if entry.required && !values.contains_key(&entry.key) && entry.default.is_none() {
                report.error(ValidationError::values(
                    format!("Missing required value: {}", entry.key),
                    Some(environment),
                ));
            }
        }
    }

    fn check_secret(
        &self,
        entry: &SchemaValue,
        value: &RawValue,
        environment: &str,
        report: &mut ValidationReport,
    ) {
        let invalid = || {
            ValidationError::values(
                format!("Invalid secret structure for {}", entry.key),
                Some(environment),
            )
        };

        let Some(secret) = value.as_secret() else {
            report.error(invalid());
            return;
        };

        match secret.validate() {
            Ok(source) => {
                let unnamed = matches!(&source, SecretSource::Env { name } if name.is_empty());
                if !unnamed && !source.is_available(self.env) {
                    report.warn(
                        format!(
                            "Environment variable not found: {} (key: {}, env: {})",
                            secret.label(),
                            entry.key,
                            environment
                        ),
                        environment,
                    );
                }
            }
            Err(SecretError::Unsupported { kind }) => {
                report.error(ValidationError::values(
                    format!("Unsupported secret type: {}", kind),
                    Some(environment),
                ));
            }
            Err(_) => report.error(invalid()),
        }
    }

    /// Validate a schema and any number of environments
    pub fn validate(
        &self,
        schema: &Schema,
        environments: &[(&str, Option<&EnvironmentValues>)],
    ) -> ValidationReport {
        let mut report = ValidationReport::default();
        self.check_schema(schema, &mut report);
        for (name, values) in environments {
            self.check_environment(schema, name, *values, &mut report);
        }
        report
    }

    /// Validate documents on disk
    ///
    /// With no environment given, every environment that has a values
    /// document is checked. A schema that cannot be loaded at all yields a
    /// single error and no values checks.
    pub fn validate_files(
        &self,
        schema_path: &Path,
        store: &ValueStore,
        environment: Option<&str>,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();

        let schema = match Schema::from_file(schema_path) {
            Ok(schema) => schema,
            Err(err) => {
                report.error(ValidationError::schema(schema_load_message(err, schema_path)));
                return report;
            }
        };
        self.check_schema(&schema, &mut report);

        let environments = match environment {
            Some(env) => vec![env.to_string()],
            None => match store.environments() {
                Ok(found) => found,
                Err(err) => {
                    report.error(ValidationError::values(
                        format!("Failed to list values documents: {}", err),
                        None,
                    ));
                    return report;
                }
            },
        };

        for env in &environments {
            match store.load(env) {
                Ok(values) => self.check_environment(&schema, env, values.as_ref(), &mut report),
                Err(err) => {
                    report.environments.push(env.clone());
                    report.error(ValidationError::values(err.to_string(), Some(env)));
                }
            }
        }

        report
    }
}

fn schema_load_message(err: CoreError, path: &Path) -> String {
    match err {
        CoreError::SchemaNotFound { .. } => format!("File not found: {}", path.display()),
        CoreError::JsonParse(err) => format!("Invalid JSON: {}", err),
        CoreError::InvalidSchema { message } => message,
        other => format!("Invalid schema: {}", other),
    }
}

/// Validate with the process environment
///
/// Returns whether validation passed and every error found, in order.
pub fn validate_all(
    schema: &Schema,
    environments: &[(&str, Option<&EnvironmentValues>)],
) -> (bool, Vec<ValidationError>) {
    let report = Validator::default().validate(schema, environments);
    (report.is_valid(), report.errors)
}
