//! Top-k selection over raw model scores.

use crate::error::{Error, Result};
use crate::labels::LabelMap;
use crate::output::Prediction;
use std::cmp::Ordering;

/// Rank the `top_k` highest scores and attach labels.
///
/// Ties go to the lower class index. `top_k` is clamped to the number of
/// classes.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] if `scores` does not have one entry per
/// label, and [`Error::Inference`] if any score is NaN or infinite.
pub fn rank_top_k(scores: &[f32], labels: &LabelMap, top_k: usize) -> Result<Vec<Prediction>> {
    if scores.len() != labels.len() {
        return Err(Error::ShapeMismatch {
            expected: format!("{} scores", labels.len()),
            actual: format!("{} scores", scores.len()),
        });
    }

    if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
        return Err(Error::Inference {
            reason: format!("model produced a non-finite score for class {index}"),
        });
    }

    let k = top_k.min(scores.len());
    if k == 0 {
        return Ok(Vec::new());
    }

    let by_rank = |&a: &usize, &b: &usize| compare_desc(scores[a], scores[b]).then(a.cmp(&b));

    let mut order: Vec<usize> = (0..scores.len()).collect();
    if k < order.len() {
        order.select_nth_unstable_by(k - 1, by_rank);
        order.truncate(k);
    }
    order.sort_unstable_by(by_rank);

    order
        .into_iter()
        .map(|index| {
            let label = labels.get(index).ok_or_else(|| Error::Internal {
                message: format!("class index {index} outside label map"),
            })?;
            Ok(Prediction {
                label: label.to_string(),
                score: scores[index],
            })
        })
        .collect()
}

/// Descending order over finite scores.
fn compare_desc(a: f32, b: f32) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
