use crate::config::Threshold;
use crate::core::cluster::Cluster;
use crate::core::corpus::DocumentId;
use serde::Serialize;

/// A group of near-duplicate documents as handed to presentation and
/// deletion. `similarity` is a percentage summarizing the edges followed
/// while the group was built; it is not the similarity of every pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    pub members: Vec<usize>,
    pub ids: Vec<DocumentId>,
    pub edge_weights: Vec<f64>,
    pub similarity: f64,
}

impl DuplicateGroup {
    pub fn from_cluster(cluster: Cluster, ids: &[DocumentId], threshold: Threshold) -> Self {
        let similarity = summarize(&cluster.edge_weights, threshold);
        Self {
            ids: cluster.members.iter().map(|&i| ids[i].clone()).collect(),
            members: cluster.members,
            edge_weights: cluster.edge_weights,
            similarity,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.ids.contains(id)
    }
}

/// Mean edge weight as a percentage rounded to two decimals, or the
/// threshold itself when no edge was recorded.
pub fn summarize(edge_weights: &[f64], threshold: Threshold) -> f64 {
    if edge_weights.is_empty() {
        return round2(threshold.percent());
    }
    let mean = edge_weights.iter().sum::<f64>() / edge_weights.len() as f64;
    round2((mean * 100.0).clamp(0.0, 100.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
