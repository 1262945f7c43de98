//! Readiness-aware wrapper around a loaded model.

use crate::error::{Error, Result};
use crate::preprocess::{InputShape, Tensor};
use tracing::debug;

/// Raw per-class scores for one image, indexed by class.
pub type ScoreVector = Vec<f32>;

/// A loaded image classifier.
///
/// Implementations must be safe to call from several request handlers at
/// once; backends whose runtime needs exclusive access serialize internally.
pub trait Model: Send + Sync {
    /// Shape of a single input image.
    fn input_shape(&self) -> InputShape;

    /// Number of output classes, if the model declares it.
    fn num_classes(&self) -> Option<usize> {
        None
    }

    /// Run a forward pass over a batch, returning one score vector per input.
    fn predict(&self, batch: &[&Tensor]) -> Result<Vec<ScoreVector>>;
}

enum EngineState {
    Ready(Box<dyn Model>),
    Unavailable(String),
}

/// Owns the process-wide model and records whether startup succeeded.
pub struct InferenceEngine {
    state: EngineState,
}

impl InferenceEngine {
    /// Engine backed by a successfully loaded model.
    pub fn ready(model: impl Model + 'static) -> Self {
        Self {
            state: EngineState::Ready(Box::new(model)),
        }
    }

    /// Engine whose startup failed. Stays unavailable for the process lifetime.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: EngineState::Unavailable(reason.into()),
        }
    }

    /// Whether the model loaded.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, EngineState::Ready(_))
    }

    /// Startup failure, if any.
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            EngineState::Ready(_) => None,
            EngineState::Unavailable(reason) => Some(reason),
        }
    }

    fn model(&self) -> Result<&dyn Model> {
        match &self.state {
            EngineState::Ready(model) => Ok(model.as_ref()),
            EngineState::Unavailable(reason) => Err(Error::NotReady {
                reason: reason.clone(),
            }),
        }
    }

    /// Input shape of the loaded model.
    pub fn input_shape(&self) -> Result<InputShape> {
        Ok(self.model()?.input_shape())
    }

    /// Number of output classes declared by the model.
    pub fn num_classes(&self) -> Option<usize> {
        self.model().ok().and_then(|model| model.num_classes())
    }

    /// Predict a batch of tensors.
    ///
    /// Every tensor must match the model's input shape. The output holds
    /// exactly one score vector per input, in input order.
    pub fn predict(&self, batch: &[&Tensor]) -> Result<Vec<ScoreVector>> {
        let model = self.model()?;
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let expected = model.input_shape();
        if let Some(bad) = batch.iter().find(|t| t.shape() != expected) {
            return Err(Error::ShapeMismatch {
                expected: expected.to_string(),
                actual: bad.shape().to_string(),
            });
        }

        debug!("Running inference on batch of {}", batch.len());
        let scores = model.predict(batch)?;

        if scores.len() != batch.len() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} score vectors", batch.len()),
                actual: format!("{} score vectors", scores.len()),
            });
        }

        Ok(scores)
    }
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            EngineState::Ready(model) => f
                .debug_struct("InferenceEngine")
                .field("ready", &true)
                .field("input_shape", &model.input_shape())
                .finish(),
            EngineState::Unavailable(reason) => f
                .debug_struct("InferenceEngine")
                .field("ready", &false)
                .field("reason", reason)
                .finish(),
        }
    }
}
