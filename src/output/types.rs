//! Output type definitions.

use serde::{Serialize, Serializer};

/// A single ranked species prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Species display name.
    pub label: String,
    /// Model score for this species.
    pub score: f32,
}

/// Failure attributed to one image of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemError {
    /// Zero-based position of the image in the upload.
    pub index: usize,
    /// Human-readable reason.
    pub message: String,
}

impl std::fmt::Display for ItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error processing image {}: {}", self.index, self.message)
    }
}

/// Outcome for one uploaded image.
///
/// Serializes as either an array of predictions or an error string, so a
/// batch response is a plain JSON array mixing both.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Top-k predictions, descending by score.
    Ranked(Vec<Prediction>),
    /// The image could not be classified.
    Failed(ItemError),
}

impl ItemOutcome {
    /// Build a failure outcome.
    pub fn failed(index: usize, message: impl Into<String>) -> Self {
        Self::Failed(ItemError {
            index,
            message: message.into(),
        })
    }

    /// Whether this outcome carries predictions.
    pub fn is_ranked(&self) -> bool {
        matches!(self, Self::Ranked(_))
    }
}

impl Serialize for ItemOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ranked(predictions) => predictions.serialize(serializer),
            Self::Failed(error) => serializer.collect_str(error),
        }
    }
}
