//! HVM Core - schema and values engine for Helm values management
//!
//! This crate provides the types behind the `hvm` command:
//! - `Schema`: typed declarations of configuration values
//! - `ValueStore`: per-environment values documents
//! - `SecretRef`: references to secrets held in environment variables
//! - `Validator`: accumulating schema and values checks
//! - `Generator`: assembly of the nested values file handed to Helm

pub mod config;
pub mod error;
pub mod generator;
pub mod lock;
pub mod raw;
pub mod schema;
pub mod secrets;
pub mod store;
pub mod validator;
pub mod values;

pub use config::{Settings, SETTINGS_FILE};
pub use error::{CoreError, Result};
pub use generator::{generate_values, GenerateError, Generator};
pub use lock::{FileLock, LOCK_FILE};
pub use raw::RawValue;
pub use schema::{Schema, SchemaUpdate, SchemaValue, ValueType, SUPPORTED_VERSION};
pub use secrets::{EnvSource, ProcessEnv, SecretError, SecretRef, SecretSource};
pub use store::{DocumentLayout, EnvironmentValues, ValueStore};
pub use validator::{
    validate_all, ErrorContext, ValidationError, ValidationReport, ValidationWarning, Validator,
};
pub use values::Values;
