use crate::core::vectorize::{SparseVector, TfIdfMatrix};
use serde::Serialize;

/// Square, symmetric, non-negative pairwise similarities indexed by corpus
/// position. The diagonal is always zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Cosine similarity of every pair of rows. All `n * n` entries are
    /// materialized; each unordered pair is computed once and mirrored.
    pub fn compute(vectors: &TfIdfMatrix) -> Self {
        let rows = vectors.rows();
        let norms: Vec<f64> = rows.iter().map(SparseVector::norm).collect();
        let mut matrix = Self::zeros(rows.len());

        for i in 0..rows.len() {
            for j in (i + 1)..rows.len() {
                let similarity = cosine_with_norms(&rows[i], norms[i], &rows[j], norms[j]);
                matrix.set(i, j, similarity);
            }
        }
        matrix
    }

    /// Build from precomputed `(i, j, similarity)` pairs; missing pairs are 0
    /// and pairs on the diagonal are ignored. Values are clamped to `[0, 1]`.
    pub fn from_pairs(size: usize, pairs: &[(usize, usize, f64)]) -> Self {
        let mut matrix = Self::zeros(size);
        for &(i, j, similarity) in pairs {
            if i != j && i < size && j < size {
                matrix.set(i, j, similarity.clamp(0.0, 1.0));
            }
        }
        matrix
    }

    fn zeros(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    fn set(&mut self, i: usize, j: usize, similarity: f64) {
        self.values[i * self.size + j] = similarity;
        self.values[j * self.size + i] = similarity;
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }
}

/// Cosine of the angle between two vectors; 0 when either has zero length.
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    cosine_with_norms(a, a.norm(), b, b.norm())
}

fn cosine_with_norms(a: &SparseVector, norm_a: f64, b: &SparseVector, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (a.dot(b) / (norm_a * norm_b)).clamp(0.0, 1.0)
}
