//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use hvm_core::{CoreError, GenerateError};
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Validation found errors in the schema or values
    #[error("Validation failed with {errors} error(s)")]
    #[diagnostic(code(hvm::cli::validation))]
    Validation {
        errors: usize,
        #[help]
        help: Option<String>,
    },

    /// Values could not be generated
    #[error("Generation failed: {message}")]
    #[diagnostic(code(hvm::cli::generate))]
    Generation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid user input (unknown key, unparsable value, existing value)
    #[error("{message}")]
    #[diagnostic(code(hvm::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(hvm::cli::io))]
    Io { message: String },

    /// Wrapped core error (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(hvm::cli::error))]
    Other {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::ERROR,
            CliError::Generation { .. } => exit_codes::ERROR,
            CliError::Input { .. } => exit_codes::ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a validation failure
    pub fn validation(errors: usize) -> Self {
        Self::Validation { errors, help: None }
    }

    /// Create a validation failure with help text
    pub fn validation_with_help(errors: usize, help: impl Into<String>) -> Self {
        Self::Validation {
            errors,
            help: Some(help.into()),
        }
    }

    /// Create an input error (user provided invalid input)
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: None,
        }
    }

    /// Create an input error with help text
    pub fn input_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(err) => err.into(),
            CoreError::SchemaNotFound { path } => CliError::Other {
                message: format!("Schema not found: {}", path),
                help: Some("Run 'hvm init' to create a schema".to_string()),
            },
            CoreError::KeyNotFound { .. } => CliError::Other {
                message: err.to_string(),
                help: Some("Run 'hvm schema list' to see declared keys".to_string()),
            },
            CoreError::ValueParse { message } => CliError::input(message),
            other => CliError::Other {
                message: other.to_string(),
                help: None,
            },
        }
    }
}

impl From<GenerateError> for CliError {
    fn from(err: GenerateError) -> Self {
        let help = match &err {
            GenerateError::MissingRequired { environment, .. } => Some(format!(
                "Set them with 'hvm values set <key> <value> --env {}'",
                environment
            )),
            GenerateError::Secret { .. } => {
                Some("Export the referenced environment variable before generating".to_string())
            }
            GenerateError::PathConflict { .. } => None,
        };
        CliError::Generation {
            message: err.to_string(),
            help,
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
