//! Per-environment values documents
//!
//! Each environment has one document named `values-<env>.json` in the
//! values directory. The canonical layout nests values under the
//! environment name:
//!
//! ```json
//! { "dev": { "replicas": 1, "db-password": { "type": "env", "name": "DB_PW" } } }
//! ```
//!
//! The flat layout, with keys at the top level, is still readable and
//! writable when configured.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::lock::{FileLock, LOCK_FILE};
use crate::raw::RawValue;

const FILE_PREFIX: &str = "values-";
const FILE_SUFFIX: &str = ".json";

/// How values are arranged inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentLayout {
    /// `{ "<env>": { "<key>": value } }`
    #[default]
    Keyed,
    /// `{ "<key>": value }`
    Flat,
}

/// Values set for one environment, keyed by schema key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentValues(BTreeMap<String, RawValue>);

impl EnvironmentValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Option<RawValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<RawValue> {
        self.0.remove(key)
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Extract one environment's values from a parsed document
    pub fn from_document(
        document: JsonValue,
        environment: &str,
        layout: DocumentLayout,
    ) -> std::result::Result<Self, String> {
        let JsonValue::Object(mut root) = document else {
            return Err("expected a JSON object".to_string());
        };

        let entries = match layout {
            DocumentLayout::Flat => root,
            DocumentLayout::Keyed => match root.remove(environment) {
                None => Map::new(),
                Some(JsonValue::Object(entries)) => entries,
                Some(_) => {
                    return Err(format!(
                        "entry for environment '{}' must be an object",
                        environment
                    ));
                }
            },
        };

        Ok(Self(
            entries
                .into_iter()
                .map(|(key, value)| (key, RawValue::from(value)))
                .collect(),
        ))
    }

    fn to_map(&self) -> Map<String, JsonValue> {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for EnvironmentValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Directory of per-environment values documents
#[derive(Debug, Clone)]
pub struct ValueStore {
    dir: PathBuf,
    layout: DocumentLayout,
}

impl ValueStore {
    /// Store using the keyed layout
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            layout: DocumentLayout::Keyed,
        }
    }

    pub fn with_layout(mut self, layout: DocumentLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn layout(&self) -> DocumentLayout {
        self.layout
    }

    /// Document path for an environment
    pub fn path_for(&self, environment: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", FILE_PREFIX, environment, FILE_SUFFIX))
    }

    /// Load an environment's values; `None` when it has no document
    pub fn load(&self, environment: &str) -> Result<Option<EnvironmentValues>> {
        let path = self.path_for(environment);
        if !path.exists() {
            tracing::debug!(environment, path = %path.display(), "no values document");
            return Ok(None);
        }

        let document = read_document(&path)?;
        let values = EnvironmentValues::from_document(document, environment, self.layout)
            .map_err(|message| CoreError::InvalidValues {
                path: path.display().to_string(),
                message,
            })?;
        tracing::debug!(environment, entries = values.len(), "loaded values");
        Ok(Some(values))
    }

    /// Load an environment's values, treating a missing document as empty
    pub fn load_or_default(&self, environment: &str) -> Result<EnvironmentValues> {
        Ok(self.load(environment)?.unwrap_or_default())
    }

    /// Write an environment's values
    ///
    /// With the keyed layout, other top-level entries of an existing document
    /// are preserved.
    pub fn save(&self, environment: &str, values: &EnvironmentValues) -> Result<()> {
        let path = self.path_for(environment);
        std::fs::create_dir_all(&self.dir)?;

        let document = match self.layout {
            DocumentLayout::Flat => JsonValue::Object(values.to_map()),
            DocumentLayout::Keyed => {
                let mut root = if path.exists() {
                    match read_document(&path)? {
                        JsonValue::Object(root) => root,
                        _ => {
                            return Err(CoreError::InvalidValues {
                                path: path.display().to_string(),
                                message: "expected a mapping at the top level".to_string(),
                            });
                        }
                    }
                } else {
                    Map::new()
                };
                root.insert(environment.to_string(), JsonValue::Object(values.to_map()));
                JsonValue::Object(root)
            }
        };

        let mut content = serde_json::to_string_pretty(&document)?;
        content.push('\n');
        std::fs::write(&path, content)?;
        tracing::debug!(environment, path = %path.display(), "saved values");
        Ok(())
    }

    /// Environments that have a document, sorted by name
    pub fn environments(&self) -> Result<Vec<String>> {
        let dir = glob::Pattern::escape(&self.dir.to_string_lossy());
        let pattern = format!("{}/{}*{}", dir, FILE_PREFIX, FILE_SUFFIX);

        let mut environments = Vec::new();
        for entry in glob::glob(&pattern)? {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!("skipping unreadable entry: {}", err);
                    continue;
                }
            };
            let environment = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(FILE_PREFIX))
                .and_then(|n| n.strip_suffix(FILE_SUFFIX));
            if let Some(environment) = environment.filter(|e| !e.is_empty()) {
                environments.push(environment.to_string());
            }
        }
        environments.sort();
        Ok(environments)
    }

    /// Take the exclusive lock guarding writes to this store
    pub fn lock(&self) -> Result<FileLock> {
        FileLock::acquire(self.dir.join(LOCK_FILE))
    }
}

fn read_document(path: &Path) -> Result<JsonValue> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|err| CoreError::InvalidValues {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}
