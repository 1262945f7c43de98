//! Process-wide context shared by request handlers.

use crate::error::{Error, Result};
use crate::inference::{InferenceEngine, ModelManifest, OnnxModel, OnnxOptions};
use crate::labels::LabelMap;
use crate::pipeline::BatchOptions;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

/// Where to find the model artifacts at startup.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// ONNX model file.
    pub model_path: PathBuf,
    /// Label JSON file.
    pub labels_path: PathBuf,
    /// Explicit manifest path.
    pub manifest_path: Option<PathBuf>,
    /// Where to write the dense label map, if anywhere.
    pub dense_labels_output: Option<PathBuf>,
    /// ONNX session options.
    pub onnx: OnnxOptions,
}

/// Immutable state built once at startup.
///
/// If loading failed the state is permanently unready; it is never rebuilt.
#[derive(Debug)]
pub struct AppState {
    engine: InferenceEngine,
    labels: Option<LabelMap>,
    defaults: BatchOptions,
}

impl AppState {
    /// Assemble state from already-loaded parts.
    pub fn new(engine: InferenceEngine, labels: Option<LabelMap>, defaults: BatchOptions) -> Self {
        Self {
            engine,
            labels,
            defaults,
        }
    }

    /// Load labels and model. Blocks until both are loaded or have failed.
    ///
    /// Failures are logged and recorded; they never abort the process.
    pub fn load(settings: &ModelSettings, defaults: BatchOptions) -> Self {
        let start = Instant::now();

        let labels = match LabelMap::load(&settings.labels_path) {
            Ok(labels) => {
                info!(
                    "Loaded {} species labels from {}",
                    labels.len(),
                    settings.labels_path.display()
                );
                write_dense_labels(&labels, settings);
                Ok(labels)
            }
            Err(e) => {
                error!("Failed to load labels: {e}");
                Err(e)
            }
        };

        let engine = match &labels {
            Ok(_) => load_engine(settings).unwrap_or_else(|e| {
                error!("Failed to load model: {e}");
                InferenceEngine::unavailable(e.to_string())
            }),
            Err(e) => InferenceEngine::unavailable(e.to_string()),
        };

        let labels = labels.ok();
        if let (Some(classes), Some(labels)) = (engine.num_classes(), &labels)
            && classes != labels.len()
        {
            warn!(
                "Model declares {classes} classes but label map has {}; affected predictions will fail",
                labels.len()
            );
        }

        if engine.is_ready() {
            info!("Startup complete in {:.2}s", start.elapsed().as_secs_f64());
        } else {
            warn!("Startup failed; /predict will return 500 until restart");
        }

        Self::new(engine, labels, defaults)
    }

    /// Whether requests can be served.
    pub fn is_ready(&self) -> bool {
        self.engine.is_ready() && self.labels.is_some()
    }

    /// Engine and labels, or why they are unavailable.
    pub fn readiness(&self) -> Result<(&InferenceEngine, &LabelMap)> {
        if let Some(reason) = self.engine.failure() {
            return Err(Error::NotReady {
                reason: reason.to_string(),
            });
        }
        let labels = self.labels.as_ref().ok_or_else(|| Error::NotReady {
            reason: "label map not loaded".to_string(),
        })?;
        Ok((&self.engine, labels))
    }

    /// Per-request defaults.
    pub fn defaults(&self) -> BatchOptions {
        self.defaults
    }
}

fn load_engine(settings: &ModelSettings) -> Result<InferenceEngine> {
    let manifest = match ModelManifest::locate(&settings.model_path, settings.manifest_path.as_deref())
    {
        Some(path) => {
            info!("Using model manifest {}", path.display());
            ModelManifest::load(&path)?
        }
        None => ModelManifest::default(),
    };

    let model = OnnxModel::load(&settings.model_path, &manifest, &settings.onnx)?;
    Ok(InferenceEngine::ready(model))
}

fn write_dense_labels(labels: &LabelMap, settings: &ModelSettings) {
    let Some(path) = &settings.dense_labels_output else {
        return;
    };
    match labels.write_dense(path) {
        Ok(()) => info!("Wrote dense label map to {}", path.display()),
        Err(e) => warn!("Could not write dense label map: {e}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::num::NonZeroUsize;
    use tempfile::{NamedTempFile, tempdir};

    fn defaults() -> BatchOptions {
        BatchOptions {
            top_k: NonZeroUsize::new(5).unwrap(),
            batch_size: NonZeroUsize::new(8).unwrap(),
        }
    }

    fn labels_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"1355868": "Lactuca virosa", "1355920": "Pyracantha coccinea"}}"#)
            .unwrap();
        file
    }

    #[test]
    fn test_missing_model_leaves_state_unready() {
        let labels = labels_file();
        let dir = tempdir().unwrap();
        let dense = dir.path().join("dense.json");
        let settings = ModelSettings {
            model_path: dir.path().join("missing.onnx"),
            labels_path: labels.path().to_path_buf(),
            manifest_path: None,
            dense_labels_output: Some(dense.clone()),
            onnx: OnnxOptions::default(),
        };

        let state = AppState::load(&settings, defaults());

        assert!(!state.is_ready());
        let err = state.readiness().unwrap_err();
        assert!(err.to_string().contains("model file does not exist"));
        // Labels still loaded and the derived artifact was written.
        assert!(dense.exists());
    }

    #[test]
    fn test_missing_labels_leaves_state_unready() {
        let dir = tempdir().unwrap();
        let settings = ModelSettings {
            model_path: dir.path().join("model.onnx"),
            labels_path: dir.path().join("labels.json"),
            manifest_path: None,
            dense_labels_output: None,
            onnx: OnnxOptions::default(),
        };

        let state = AppState::load(&settings, defaults());

        assert!(!state.is_ready());
        assert!(matches!(state.readiness(), Err(Error::NotReady { .. })));
    }

    #[test]
    fn test_invalid_manifest_leaves_state_unready() {
        let labels = labels_file();
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("model.json");
        std::fs::write(&manifest, r#"{"layers": [{"class_name": "Conv2D", "config": {"groups": 2}}]}"#)
            .unwrap();
        let settings = ModelSettings {
            model_path: dir.path().join("model.onnx"),
            labels_path: labels.path().to_path_buf(),
            manifest_path: Some(manifest),
            dense_labels_output: None,
            onnx: OnnxOptions::default(),
        };

        let state = AppState::load(&settings, defaults());

        let err = state.readiness().unwrap_err();
        assert!(err.to_string().contains("invalid model manifest"));
    }
}
