//! Class index to species name mapping.
//!
//! Label files map the model's original class identifiers (often sparse
//! dataset IDs) to display names. The map built here is dense: the `n`-th
//! entry of the source becomes class index `n`, matching the order in which
//! the model was trained on the classes.

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Dense, read-only mapping from class index `0..N-1` to display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    names: Vec<String>,
}

impl LabelMap {
    /// Build a label map from names already in class-index order.
    ///
    /// # Errors
    /// Returns [`Error::LabelsEmpty`] if `names` is empty.
    pub fn from_names(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::LabelsEmpty);
        }
        Ok(Self { names })
    }

    /// Parse a label source.
    ///
    /// Accepts either a JSON object (`{"<class id>": "<name>", ...}`, file
    /// order preserved) or a JSON array of names.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(source).map_err(|e| Error::LabelsParse {
            reason: e.to_string(),
        })?;

        let names = match value {
            Value::Object(map) => names_from_object(map)?,
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| label_string(&i.to_string(), v))
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(Error::LabelsParse {
                    reason: format!("expected object or array, got {}", json_kind(&other)),
                });
            }
        };

        Self::from_names(names)
    }

    /// Load a label source from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::LabelsRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let map = Self::from_json_str(&contents)?;
        debug!("Loaded {} labels from {}", map.len(), path.display());
        Ok(map)
    }

    /// Name for a class index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a constructed map; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate `(index, name)` pairs in class order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().map(String::as_str).enumerate()
    }

    /// Dense JSON form: `{"0": "...", "1": "...", ...}`.
    pub fn to_dense_json(&self) -> String {
        let map: Map<String, Value> = self
            .iter()
            .map(|(i, name)| (i.to_string(), Value::String(name.to_string())))
            .collect();
        // Serializing a map of strings cannot fail.
        serde_json::to_string_pretty(&Value::Object(map)).unwrap_or_default()
    }

    /// Write the dense index file.
    pub fn write_dense(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::LabelsWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path, self.to_dense_json()).map_err(|e| Error::LabelsWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn names_from_object(map: Map<String, Value>) -> Result<Vec<String>> {
    let mut names = Vec::with_capacity(map.len());
    for (key, value) in map {
        if key.trim().is_empty() {
            return Err(Error::LabelsParse {
                reason: "empty class identifier".to_string(),
            });
        }
        names.push(label_string(&key, value)?);
    }
    Ok(names)
}

fn label_string(key: &str, value: Value) -> Result<String> {
    match value {
        Value::String(name) if !name.trim().is_empty() => Ok(name),
        Value::String(_) => Err(Error::LabelsParse {
            reason: format!("class '{key}' has an empty name"),
        }),
        other => Err(Error::LabelsParse {
            reason: format!("class '{key}' maps to {}, expected string", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
