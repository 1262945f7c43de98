//! Per-image preprocessing, batched inference and ranking with isolated
//! failures.

use crate::error::{Error, Result};
use crate::inference::{InferenceEngine, ScoreVector};
use crate::labels::LabelMap;
use crate::output::{ItemOutcome, rank_top_k};
use crate::preprocess::{Tensor, preprocess};
use std::num::NonZeroUsize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Settings shared by every image of one request.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Predictions to return per image.
    pub top_k: NonZeroUsize,
    /// Maximum images per forward pass.
    pub batch_size: NonZeroUsize,
}

/// Counts reported after a batch completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Images classified.
    pub ranked: usize,
    /// Images that failed.
    pub failed: usize,
}

impl BatchSummary {
    fn of(outcomes: &[ItemOutcome]) -> Self {
        let ranked = outcomes.iter().filter(|o| o.is_ranked()).count();
        Self {
            ranked,
            failed: outcomes.len() - ranked,
        }
    }
}

/// Classify every image, returning one outcome per image in input order.
///
/// A failure while decoding, running or ranking one image only affects that
/// image's outcome.
///
/// # Errors
/// Returns [`Error::NotReady`] if the engine never loaded a model; no image is
/// touched in that case.
pub fn classify_batch<B: AsRef<[u8]>>(
    engine: &InferenceEngine,
    labels: &LabelMap,
    images: &[B],
    options: BatchOptions,
) -> Result<Vec<ItemOutcome>> {
    let shape = engine.input_shape()?;
    let start = Instant::now();

    let prepared: Vec<Result<Tensor>> = images
        .iter()
        .map(|bytes| preprocess(bytes.as_ref(), shape))
        .collect();

    let mut scores: Vec<Option<Result<ScoreVector>>> = (0..images.len()).map(|_| None).collect();

    let ready: Vec<(usize, &Tensor)> = prepared
        .iter()
        .enumerate()
        .filter_map(|(i, t)| t.as_ref().ok().map(|t| (i, t)))
        .collect();

    for chunk in ready.chunks(options.batch_size.get()) {
        for (index, result) in predict_chunk(engine, chunk) {
            scores[index] = Some(result);
        }
    }

    let outcomes: Vec<ItemOutcome> = prepared
        .into_iter()
        .zip(scores)
        .enumerate()
        .map(|(index, (tensor, score))| {
            let ranked = tensor
                .and_then(|_| {
                    score.unwrap_or_else(|| {
                        Err(Error::Internal {
                            message: "image skipped by inference".to_string(),
                        })
                    })
                })
                .and_then(|s| rank_top_k(&s, labels, options.top_k.get()));

            match ranked {
                Ok(predictions) => ItemOutcome::Ranked(predictions),
                Err(e) => {
                    if e.is_item_error() {
                        debug!("Image {index} failed: {e}");
                    } else {
                        warn!("Image {index} failed unexpectedly: {e}");
                    }
                    ItemOutcome::failed(index, e.to_string())
                }
            }
        })
        .collect();

    let summary = BatchSummary::of(&outcomes);
    info!(
        "Classified {} image(s): {} ok, {} failed in {:.1}ms",
        outcomes.len(),
        summary.ranked,
        summary.failed,
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(outcomes)
}

/// Run one chunk through the engine.
///
/// If the batched call fails, each tensor is retried alone so the error is
/// attributed only to the images that cause it.
fn predict_chunk(
    engine: &InferenceEngine,
    chunk: &[(usize, &Tensor)],
) -> Vec<(usize, Result<ScoreVector>)> {
    let tensors: Vec<&Tensor> = chunk.iter().map(|(_, t)| *t).collect();

    match engine.predict(&tensors) {
        Ok(scores) => chunk
            .iter()
            .map(|(i, _)| *i)
            .zip(scores.into_iter().map(Ok))
            .collect(),
        Err(e) if chunk.len() > 1 => {
            warn!(
                "Batched inference over {} images failed ({e}), retrying individually",
                chunk.len()
            );
            chunk
                .iter()
                .map(|(i, t)| {
                    let result = engine.predict(&[*t]).and_then(|mut scores| {
                        scores.pop().ok_or_else(|| Error::Inference {
                            reason: "model returned no scores".to_string(),
                        })
                    });
                    (*i, result)
                })
                .collect()
        }
        Err(e) => chunk.iter().map(|(i, _)| (*i, Err(clone_item_error(&e)))).collect(),
    }
}

/// `Error` is not `Clone`; item errors are reduced to their message.
fn clone_item_error(e: &Error) -> Error {
    Error::Inference {
        reason: e.to_string(),
    }
}
