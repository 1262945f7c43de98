//! Model manifest: the sidecar JSON describing how to feed a model.
//!
//! ```json
//! {
//!   "input_shape": [256, 256, 3],
//!   "input_name": "input_1",
//!   "output_name": "predictions",
//!   "num_classes": 1081,
//!   "layers": [{"class_name": "DepthwiseConv2D", "config": {"groups": 1}}]
//! }
//! ```
//!
//! Some exporters store constructor arguments that the layer type does not
//! accept (`groups` on `DepthwiseConv2D`). Those are stripped before the
//! manifest is parsed strictly; any other unknown key is an error.

use crate::constants::{IGNORED_LAYER_PARAMS, UNSUPPORTED_LAYER_PARAMS};
use crate::error::{Error, Result};
use crate::preprocess::InputShape;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parsed model manifest.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelManifest {
    /// Input shape as `[height, width, channels]`.
    #[serde(default, deserialize_with = "deserialize_shape")]
    pub input_shape: Option<InputShape>,

    /// Name of the input tensor (defaults to the session's first input).
    #[serde(default)]
    pub input_name: Option<String>,

    /// Name of the output tensor (defaults to the session's first output).
    #[serde(default)]
    pub output_name: Option<String>,

    /// Number of output classes.
    #[serde(default)]
    pub num_classes: Option<usize>,

    /// Stored layer descriptions.
    #[serde(default)]
    pub layers: Vec<LayerSpec>,
}

/// One stored layer description.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LayerSpec {
    /// Layer type, e.g. `Conv2D`.
    pub class_name: String,
    /// Layer name.
    #[serde(default)]
    pub name: Option<String>,
    /// Stored constructor arguments.
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl ModelManifest {
    /// Parse a manifest, applying the compatibility shim first.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(source).map_err(|e| Error::ManifestParse {
            reason: e.to_string(),
        })?;

        let stripped = strip_ignored_params(&mut value);
        if stripped > 0 {
            debug!("Stripped {stripped} ignored layer parameter(s) from manifest");
        }

        let manifest: Self = serde_json::from_value(value).map_err(|e| Error::ManifestParse {
            reason: e.to_string(),
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ManifestRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&contents)
    }

    /// Manifest path to use for a model: the explicit one, or
    /// `<model>.manifest.json` when it exists.
    pub fn locate(model_path: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let candidate = model_path.with_extension("manifest.json");
        candidate.exists().then_some(candidate)
    }

    fn validate(&self) -> Result<()> {
        if let Some(shape) = self.input_shape
            && shape.is_empty()
        {
            return Err(Error::ManifestParse {
                reason: format!("input_shape {shape} has a zero dimension"),
            });
        }

        if self.num_classes == Some(0) {
            return Err(Error::ManifestParse {
                reason: "num_classes must be at least 1".to_string(),
            });
        }

        for layer in &self.layers {
            if let Some(param) = UNSUPPORTED_LAYER_PARAMS
                .iter()
                .find(|p| layer.config.contains_key(**p))
            {
                return Err(Error::ManifestParse {
                    reason: format!(
                        "layer '{}' ({}) uses unsupported parameter '{param}'",
                        layer.name.as_deref().unwrap_or("<unnamed>"),
                        layer.class_name
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Remove known-ignored constructor arguments from stored layer configs.
///
/// Returns the number of parameters removed.
fn strip_ignored_params(manifest: &mut Value) -> usize {
    let Some(layers) = manifest.get_mut("layers").and_then(Value::as_array_mut) else {
        return 0;
    };

    let mut removed = 0;
    for layer in layers {
        let Some(class_name) = layer
            .get("class_name")
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            continue;
        };
        let Some(config) = layer.get_mut("config").and_then(Value::as_object_mut) else {
            continue;
        };

        for (_, param) in IGNORED_LAYER_PARAMS
            .iter()
            .filter(|(class, _)| *class == class_name)
        {
            if config.remove(*param).is_some() {
                removed += 1;
            }
        }
    }
    removed
}

fn deserialize_shape<'de, D>(deserializer: D) -> std::result::Result<Option<InputShape>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let dims: Option<[usize; 3]> = Option::deserialize(deserializer)?;
    Ok(dims.map(|[height, width, channels]| InputShape::new(height, width, channels)))
}
