//! Score normalization and fusion.
//!
//! The two ranking models produce scores on different scales (cosine
//! similarity in [0, 1], unbounded BM25 sums), so before combining them each
//! vector is min-max rescaled into [0, 1] using its own min and max. Fused
//! scores are therefore comparable only within one query's evaluation, never
//! across separately issued requests.

use crate::error::{Result, SagittaError};
use crate::model::ScoreVector;

/// Min-max rescale a score vector to [0, 1].
///
/// Uses the vector's own min and max. A constant vector (max == min) yields
/// all zeros rather than dividing by zero.
pub fn normalize(vector: &ScoreVector) -> ScoreVector {
    let scores = vector.scores();
    if scores.is_empty() {
        return vector.clone();
    }

    let min = scores.iter().fold(f32::INFINITY, |a, &b| a.min(b));
    let max = scores.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let range = max - min;

    let rescaled = if range > 0.0 {
        scores.iter().map(|&s| (s - min) / range).collect()
    } else {
        vec![0.0; scores.len()]
    };

    ScoreVector::new(vector.doc_ids().clone(), rescaled)
        .expect("rescaled scores are aligned with doc ids")
}

/// Fuse normalized score vectors into one ranking signal by elementwise
/// arithmetic mean, aligned by doc id.
///
/// All inputs must cover the identical document-id key set; fails with
/// [`SagittaError::MismatchedKeys`] otherwise, and with
/// [`SagittaError::InvalidArgument`] for an empty input list.
pub fn fuse(vectors: &[ScoreVector]) -> Result<ScoreVector> {
    let Some(first) = vectors.first() else {
        return Err(SagittaError::invalid_argument(
            "fuse requires at least one score vector",
        ));
    };

    for vector in &vectors[1..] {
        if !first.same_keys(vector) {
            return Err(SagittaError::mismatched_keys(format!(
                "cannot fuse score vectors over different document sets ({} vs {} documents)",
                first.len(),
                vector.len()
            )));
        }
    }

    let count = vectors.len() as f32;
    let mut fused = vec![0.0f32; first.len()];
    for vector in vectors {
        for (slot, &score) in fused.iter_mut().zip(vector.scores()) {
            *slot += score;
        }
    }
    for slot in &mut fused {
        *slot /= count;
    }

    ScoreVector::new(first.doc_ids().clone(), fused)
}
