//! Inference engine for plant species classification.

mod engine;
pub mod manifest;
mod onnx;

pub use engine::{InferenceEngine, Model, ScoreVector};
pub use manifest::ModelManifest;
pub use onnx::{OnnxModel, OnnxOptions};
