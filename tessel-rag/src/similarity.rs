//! Cosine similarity between embedding vectors.

use crate::errors::{RagError, RagResult};

/// Cosine similarity of two equal-length vectors, in [-1, 1].
///
/// A zero-magnitude vector yields `0.0` ("no similarity") rather than an
/// error; mismatched lengths are an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> RagResult<f32> {
    if a.len() != b.len() {
        return Err(RagError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f32::EPSILON {
        return Ok(0.0);
    }

    Ok(dot / denom)
}
