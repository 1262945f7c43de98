//! ONNX Runtime backend.

use crate::error::{Error, Result};
use crate::inference::engine::{Model, ScoreVector};
use crate::inference::manifest::ModelManifest;
use crate::preprocess::{InputShape, Tensor};
use ort::session::Session;
use ort::value::Tensor as OrtTensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Options for building an ONNX session.
#[derive(Debug, Clone, Default)]
pub struct OnnxOptions {
    /// Intra-op thread count (0 = runtime default).
    pub intra_threads: usize,
}

/// Image classifier backed by an ONNX Runtime session.
///
/// `Session::run` needs exclusive access, so the session sits behind a
/// mutex: concurrent requests are served one forward pass at a time.
pub struct OnnxModel {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    input_shape: InputShape,
    num_classes: Option<usize>,
}

impl OnnxModel {
    /// Load a model file, applying settings from its manifest.
    pub fn load(path: &Path, manifest: &ModelManifest, options: &OnnxOptions) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ModelFileNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut builder = Session::builder().map_err(|e| Error::RuntimeInitialization {
            reason: e.to_string(),
        })?;
        if options.intra_threads > 0 {
            builder = builder
                .with_intra_threads(options.intra_threads)
                .map_err(|e| Error::ModelLoad {
                    reason: e.to_string(),
                })?;
        }
        let session = builder.commit_from_file(path).map_err(|e| Error::ModelLoad {
            reason: format!("{}: {e}", path.display()),
        })?;

        let input_names: Vec<&str> = session.inputs().iter().map(|i| i.name()).collect();
        let output_names: Vec<&str> = session.outputs().iter().map(|o| o.name()).collect();
        let input_name = resolve_name("input", manifest.input_name.as_deref(), &input_names)?;
        let output_name = resolve_name("output", manifest.output_name.as_deref(), &output_names)?;

        let declared_dims = session
            .inputs()
            .iter()
            .find(|input| input.name() == input_name)
            .and_then(|input| input.dtype().tensor_shape())
            .map(|shape| shape.to_vec());
        let input_shape = resolve_input_shape(manifest.input_shape, declared_dims.as_deref())?;

        info!(
            "Loaded model {}: input '{}' {}, output '{}'",
            path.display(),
            input_name,
            input_shape,
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_shape,
            num_classes: manifest.num_classes,
        })
    }
}

impl Model for OnnxModel {
    fn input_shape(&self) -> InputShape {
        self.input_shape
    }

    fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }

    fn predict(&self, batch: &[&Tensor]) -> Result<Vec<ScoreVector>> {
        let n = batch.len();
        let shape = self.input_shape;

        let mut data = Vec::with_capacity(n * shape.len());
        for tensor in batch {
            data.extend_from_slice(tensor.data());
        }

        let input = OrtTensor::from_array(([n, shape.height, shape.width, shape.channels], data))
            .map_err(|e| Error::Inference {
                reason: format!("failed to build input tensor: {e}"),
            })?;

        let mut session = self.session.lock().map_err(|_| Error::Inference {
            reason: "session lock poisoned".to_string(),
        })?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| Error::Inference {
                reason: format!("model produced no output named '{}'", self.output_name),
            })?;
        let (out_shape, scores) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference {
                reason: format!("failed to read output '{}': {e}", self.output_name),
            })?;
        debug!("Model output shape: {out_shape:?}");

        if scores.is_empty() || scores.len() % n != 0 {
            return Err(Error::ShapeMismatch {
                expected: format!("{n} equal rows of scores"),
                actual: format!("{} values", scores.len()),
            });
        }

        let classes = scores.len() / n;
        Ok(scores.chunks(classes).map(<[f32]>::to_vec).collect())
    }
}

/// Pick a tensor name: the requested one if the session declares it,
/// otherwise the session's first.
fn resolve_name(kind: &str, requested: Option<&str>, available: &[&str]) -> Result<String> {
    match requested {
        Some(name) if available.contains(&name) => Ok(name.to_string()),
        Some(name) => Err(Error::ModelLoad {
            reason: format!(
                "model has no {kind} named '{name}' (available: {})",
                available.join(", ")
            ),
        }),
        None => available
            .first()
            .map(|name| (*name).to_string())
            .ok_or_else(|| Error::ModelLoad {
                reason: format!("model declares no {kind}s"),
            }),
    }
}

/// Reconcile the configured input shape with the dims the model declares.
///
/// `declared` is `[batch, height, width, channels]`; negative entries are
/// dynamic and match anything. Without a configured shape, static declared
/// dims are used and the default fills the dynamic ones.
fn resolve_input_shape(
    configured: Option<InputShape>,
    declared: Option<&[i64]>,
) -> Result<InputShape> {
    let Some(dims) = declared else {
        debug!("Model does not declare an input shape");
        return Ok(configured.unwrap_or_default());
    };

    let &[_, height, width, channels] = dims else {
        return Err(Error::ModelLoad {
            reason: format!("expected a 4-D NHWC image input, model declares {dims:?}"),
        });
    };

    let fallback = configured.unwrap_or_default();
    let pick = |declared: i64, fallback: usize| {
        usize::try_from(declared)
            .ok()
            .filter(|d| *d > 0)
            .unwrap_or(fallback)
    };
    let shape = configured.unwrap_or_else(|| {
        InputShape::new(
            pick(height, fallback.height),
            pick(width, fallback.width),
            pick(channels, fallback.channels),
        )
    });

    if !matches!(shape.channels, 1 | 3) {
        return Err(Error::ModelLoad {
            reason: format!("expected an NHWC input with 1 or 3 channels, model declares {dims:?}"),
        });
    }

    let matches = |declared: i64, actual: usize| {
        declared < 0 || usize::try_from(declared).is_ok_and(|d| d == actual)
    };
    if matches(height, shape.height)
        && matches(width, shape.width)
        && matches(channels, shape.channels)
    {
        Ok(shape)
    } else {
        Err(Error::ShapeMismatch {
            expected: format!("model input {dims:?}"),
            actual: format!("configured input {shape}"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_name_defaults_to_first() {
        let name = resolve_name("output", None, &["predictions", "features"]).unwrap();
        assert_eq!(name, "predictions");
    }

    #[test]
    fn test_resolve_name_rejects_unknown() {
        let result = resolve_name("output", Some("logits"), &["predictions"]);
        let err = result.unwrap_err();
        assert!(matches!(err, Error::ModelLoad { .. }));
        assert!(err.to_string().contains("logits"));

        assert!(resolve_name("input", None, &[]).is_err());
        assert_eq!(
            resolve_name("input", Some("input_1"), &["input_1"]).unwrap(),
            "input_1"
        );
    }

    #[test]
    fn test_input_shape_taken_from_static_model_dims() {
        let shape = resolve_input_shape(None, Some([-1, 224, 224, 3].as_slice())).unwrap();
        assert_eq!(shape, InputShape::new(224, 224, 3));
    }

    #[test]
    fn test_dynamic_dims_use_default() {
        let shape = resolve_input_shape(None, Some([-1, -1, -1, 3].as_slice())).unwrap();
        assert_eq!(shape, InputShape::default());
        assert_eq!(resolve_input_shape(None, None).unwrap(), InputShape::default());
    }

    #[test]
    fn test_configured_shape_must_match_model() {
        let configured = Some(InputShape::new(256, 256, 3));
        assert!(resolve_input_shape(configured, Some([1, 256, 256, 3].as_slice())).is_ok());
        assert!(matches!(
            resolve_input_shape(configured, Some([1, 224, 224, 3].as_slice())),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_non_image_input_is_rejected() {
        assert!(matches!(
            resolve_input_shape(None, Some([1, 3, 224].as_slice())),
            Err(Error::ModelLoad { .. })
        ));
        // NCHW layout: channels-first is not what the preprocessor produces.
        assert!(matches!(
            resolve_input_shape(None, Some([1, 3, 224, 224].as_slice())),
            Err(Error::ModelLoad { .. })
        ));
    }
}
