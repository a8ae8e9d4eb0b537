//! Project settings
//!
//! Read from `.hvm.yaml` in the working directory when present:
//!
//! ```yaml
//! schemaFile: schema.json
//! valuesDir: environments
//! layout: keyed
//! ```
//!
//! Relative paths are resolved against the directory holding the settings
//! file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::store::{DocumentLayout, ValueStore};

/// Default settings file name
pub const SETTINGS_FILE: &str = ".hvm.yaml";

/// Where the schema and values documents live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_schema_file")]
    pub schema_file: PathBuf,

    #[serde(default = "default_values_dir")]
    pub values_dir: PathBuf,

    #[serde(default)]
    pub layout: DocumentLayout,
}

fn default_schema_file() -> PathBuf {
    PathBuf::from("schema.json")
}

fn default_values_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_file: default_schema_file(),
            values_dir: default_values_dir(),
            layout: DocumentLayout::default(),
        }
    }
}

impl Settings {
    /// Load `.hvm.yaml` from `dir`, falling back to defaults
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(SETTINGS_FILE);
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default().relative_to(dir))
        }
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content)?
        };

        if settings.schema_file.as_os_str().is_empty() {
            return Err(CoreError::InvalidSettings {
                message: format!("schemaFile must not be empty in {}", path.display()),
            });
        }

        tracing::debug!(path = %path.display(), "loaded settings");
        let base = path.parent().unwrap_or(Path::new(""));
        Ok(settings.relative_to(base))
    }

    /// Replace file settings with command-line values
    pub fn with_overrides(mut self, schema_file: Option<PathBuf>, values_dir: Option<PathBuf>) -> Self {
        if let Some(schema_file) = schema_file {
            self.schema_file = schema_file;
        }
        if let Some(values_dir) = values_dir {
            self.values_dir = values_dir;
        }
        self
    }

    pub fn schema_path(&self) -> &Path {
        &self.schema_file
    }

    /// Value store for the configured directory and layout
    pub fn store(&self) -> ValueStore {
        ValueStore::new(&self.values_dir).with_layout(self.layout)
    }

    fn relative_to(mut self, base: &Path) -> Self {
        if base.as_os_str().is_empty() || base == Path::new(".") {
            return self;
        }
        if self.schema_file.is_relative() {
            self.schema_file = base.join(&self.schema_file);
        }
        if self.values_dir.is_relative() {
            self.values_dir = base.join(&self.values_dir);
        }
        self
    }
}
