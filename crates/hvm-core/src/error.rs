//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Schema not found: {path}")]
    SchemaNotFound { path: String },

    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Key '{key}' already exists in schema")]
    DuplicateKey { key: String },

    #[error("Value with key '{key}' not found")]
    KeyNotFound { key: String },

    #[error("Invalid path format: {path}")]
    InvalidPath { path: String },

    #[error("Path conflicts with an existing value: {path}")]
    PathConflict { path: String },

    #[error("Invalid values document {path}: {message}")]
    InvalidValues { path: String, message: String },

    #[error("{message}")]
    ValueParse { message: String },

    #[error("Invalid settings: {message}")]
    InvalidSettings { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
