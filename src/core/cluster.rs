//! Threshold graph clustering over a similarity matrix.
//!
//! Documents are nodes; `(i, j)` is an edge when `M[i][j] >= threshold`.
//! Connected components are found with an explicit-stack depth-first walk
//! that scans candidates in ascending corpus order, so membership is a pure
//! function of the matrix and the threshold.
//!
//! Only the edge that pulls a node into its component is recorded, so a
//! component of `k` documents carries `k - 1` weights: a spanning tree picked
//! by traversal order. Pairs inside a component that were never walked do not
//! contribute, and the summary built from the list is a coarse
//! representative, not pairwise truth.

use crate::config::Threshold;
use crate::core::similarity::SimilarityMatrix;

/// Slack applied when comparing a weight to the threshold so identical
/// documents still qualify at 100% despite rounding in the cosine.
pub const SIMILARITY_EPSILON: f64 = 1e-9;

/// A connected component of at least two documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Corpus positions, ascending.
    pub members: Vec<usize>,
    /// Weights of the edges followed during traversal, in discovery order.
    pub edge_weights: Vec<f64>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

pub fn qualifies(weight: f64, threshold: Threshold) -> bool {
    weight + SIMILARITY_EPSILON >= threshold.ratio()
}

/// Partition the qualifying nodes of `matrix` into connected components.
/// Components of size one are dropped.
pub fn cluster(matrix: &SimilarityMatrix, threshold: Threshold) -> Vec<Cluster> {
    let n = matrix.len();
    let mut visited = vec![false; n];
    let mut clusters = Vec::new();

    for seed in 0..n {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;

        let mut members = vec![seed];
        let mut edge_weights = Vec::new();
        let mut stack = vec![seed];

        while let Some(current) = stack.pop() {
            for (j, &weight) in matrix.row(current).iter().enumerate() {
                if j == current || visited[j] || !qualifies(weight, threshold) {
                    continue;
                }
                visited[j] = true;
                members.push(j);
                stack.push(j);
                edge_weights.push(weight);
            }
        }

        if members.len() > 1 {
            members.sort_unstable();
            clusters.push(Cluster {
                members,
                edge_weights,
            });
        }
    }

    clusters
}
