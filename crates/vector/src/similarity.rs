//! Cosine similarity scoring
//!
//! Scores are accumulated in `f64` and reported as `f32` in [-1, 1].
//! A zero-norm vector has similarity 0 to every vector, including
//! another zero vector, so NaN never reaches ranking.

use ndarray::Array1;
use vecsearch_common::{Result, VecSearchError};

use crate::types::EmbeddingVector;

/// Cosine similarity between two vectors of equal dimension
pub fn cosine_similarity(a: &EmbeddingVector, b: &EmbeddingVector) -> Result<f32> {
    QueryScorer::new(a).score(b)
}

/// Query vector prepared once and scored against many corpus vectors
#[derive(Debug, Clone)]
pub struct QueryScorer {
    values: Array1<f64>,
    norm: f64,
}

impl QueryScorer {
    pub fn new(query: &EmbeddingVector) -> Self {
        let values = to_f64(query.as_slice());
        let norm = values.dot(&values).sqrt();
        Self { values, norm }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Score `other` against the prepared query
    pub fn score(&self, other: &EmbeddingVector) -> Result<f32> {
        if other.dimension() != self.dimension() {
            return Err(VecSearchError::dimension_mismatch(
                self.dimension(),
                other.dimension(),
            ));
        }

        let other = to_f64(other.as_slice());
        let other_norm = other.dot(&other).sqrt();
        let denominator = self.norm * other_norm;

        if denominator == 0.0 || !denominator.is_finite() {
            return Ok(0.0);
        }

        let score = self.values.dot(&other) / denominator;
        if !score.is_finite() {
            return Ok(0.0);
        }

        // Rounding can push |score| slightly past 1
        Ok(score.clamp(-1.0, 1.0) as f32)
    }
}

fn to_f64(values: &[f32]) -> Array1<f64> {
    values.iter().map(|&v| f64::from(v)).collect()
}
