//! Configuration type definitions.

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_BODY_LIMIT_BYTES, DEFAULT_HOST, DEFAULT_INTRA_THREADS,
    DEFAULT_LABELS_PATH, DEFAULT_MODEL_PATH, DEFAULT_PORT, DEFAULT_TOP_K,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Model and label file locations.
    pub model: ModelConfig,

    /// Inference settings.
    pub inference: InferenceConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,

    /// Listening port. The `PORT` environment variable takes precedence.
    pub port: u16,

    /// Maximum accepted request body size in bytes.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

/// Model file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX model file.
    pub path: PathBuf,

    /// Path to the class-index-to-species JSON file.
    pub labels: PathBuf,

    /// Path to the model manifest (default: `<model>.manifest.json` if present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,

    /// Where to write the derived dense label map at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dense_labels_output: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
            labels: PathBuf::from(DEFAULT_LABELS_PATH),
            manifest: None,
            dense_labels_output: None,
        }
    }
}

/// Inference settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Predictions returned per image when a request does not say.
    pub top_k: usize,

    /// Maximum images per forward pass.
    pub batch_size: usize,

    /// ONNX intra-op threads (0 = runtime default).
    pub intra_threads: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            batch_size: DEFAULT_BATCH_SIZE,
            intra_threads: DEFAULT_INTRA_THREADS,
        }
    }
}
