//! The duplicate-detection engine.
//!
//! [`DuplicateEngine`] owns the corpus, the similarity matrix and the groups
//! of the last run. A run is synchronous and all-or-nothing: progress is
//! reported at stage boundaries (and per document while normalizing), and
//! engine state only changes once a stage has completed.

use crate::config::Threshold;
use crate::core::cluster::cluster;
use crate::core::corpus::{Corpus, Document, DocumentId, SourceDocument};
use crate::core::normalize::Normalizer;
use crate::core::similarity::SimilarityMatrix;
use crate::core::summary::DuplicateGroup;
use crate::core::vectorize::TfIdfMatrix;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    Normalizing,
    Vectorizing,
    ComputingSimilarity,
    Clustering,
    Summarizing,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProgress {
    pub phase: RunPhase,
    pub processed: usize,
    pub total: usize,
}

impl RunProgress {
    fn new(phase: RunPhase, processed: usize, total: usize) -> Self {
        Self {
            phase,
            processed,
            total,
        }
    }
}

/// Results of the last completed detection pass.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub threshold: Threshold,
    pub ids: Vec<DocumentId>,
    pub matrix: SimilarityMatrix,
    pub groups: Vec<DuplicateGroup>,
}

pub struct DuplicateEngine {
    normalizer: Normalizer,
    corpus: Corpus,
    outcome: Option<RunOutcome>,
    removed: HashSet<DocumentId>,
    cancellation_token: Arc<AtomicBool>,
}

impl DuplicateEngine {
    pub fn new(normalizer: Normalizer) -> Self {
        Self {
            normalizer,
            corpus: Corpus::new(),
            outcome: None,
            removed: HashSet::new(),
            cancellation_token: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancellation_token(&self) -> Arc<AtomicBool> {
        self.cancellation_token.clone()
    }

    pub fn cancel(&self) {
        self.cancellation_token.store(true, Ordering::Relaxed);
    }

    /// Consume a pending cancellation request. The operation that observes it
    /// aborts; the next one starts with a clear token.
    fn take_cancellation(&self) -> bool {
        self.cancellation_token.swap(false, Ordering::Relaxed)
    }

    /// Normalize `sources` into a fresh corpus, replacing the current one and
    /// discarding the previous run. On cancellation the engine is left as it
    /// was before the call. A request made before the call is honoured at the
    /// first document.
    pub fn load<I>(
        &mut self,
        sources: I,
        progress: &mut dyn FnMut(RunProgress),
    ) -> Result<usize, EngineError>
    where
        I: IntoIterator<Item = SourceDocument>,
        I::IntoIter: ExactSizeIterator,
    {
        let sources = sources.into_iter();
        let total = sources.len();
        let mut corpus = Corpus::new();

        progress(RunProgress::new(RunPhase::Normalizing, 0, total));
        for (processed, source) in sources.enumerate() {
            if self.take_cancellation() {
                tracing::info!(processed, total, "load cancelled");
                return Err(EngineError::Cancelled);
            }

            let normalized_text = self.normalizer.normalize(&source.text);
            if normalized_text.is_empty() {
                tracing::debug!(id = %source.id, "document is empty after normalization");
            }
            corpus.push(Document {
                id: source.id,
                original_text: source.text,
                normalized_text,
            });
            progress(RunProgress::new(RunPhase::Normalizing, processed + 1, total));
        }

        self.corpus = corpus;
        self.outcome = None;
        self.removed.clear();
        Ok(self.corpus.len())
    }

    /// Vectorize the current corpus, compute all pairwise similarities and
    /// group documents connected by edges at or above `threshold`. A pending
    /// cancellation is honoured before vectorizing; the matrix stage itself
    /// runs to completion.
    pub fn detect(
        &mut self,
        threshold: Threshold,
        progress: &mut dyn FnMut(RunProgress),
    ) -> Result<&[DuplicateGroup], EngineError> {
        let total = self.corpus.len();
        if total < 2 {
            return Err(EngineError::InsufficientInput { found: total });
        }
        if self.take_cancellation() {
            tracing::info!(documents = total, "detection cancelled before vectorizing");
            return Err(EngineError::Cancelled);
        }

        let vectors = timed("vectorizing", || {
            TfIdfMatrix::fit(&self.corpus.normalized_texts())
        })?;
        tracing::debug!(
            documents = vectors.n_rows(),
            terms = vectors.n_cols(),
            degenerate = self.corpus.degenerate_count(),
            "vocabulary built"
        );
        progress(RunProgress::new(RunPhase::Vectorizing, total, total));

        let matrix = timed("similarity matrix", || SimilarityMatrix::compute(&vectors));
        progress(RunProgress::new(RunPhase::ComputingSimilarity, total, total));

        let clusters = timed("clustering", || cluster(&matrix, threshold));
        progress(RunProgress::new(RunPhase::Clustering, total, total));

        let ids = self.corpus.ids();
        let group_count = clusters.len();
        let mut groups = Vec::with_capacity(group_count);
        progress(RunProgress::new(RunPhase::Summarizing, 0, group_count));
        for (done, c) in clusters.into_iter().enumerate() {
            groups.push(DuplicateGroup::from_cluster(c, &ids, threshold));
            progress(RunProgress::new(RunPhase::Summarizing, done + 1, group_count));
        }
        tracing::debug!(groups = group_count, %threshold, "detection complete");

        self.removed.clear();
        let outcome = self.outcome.insert(RunOutcome {
            threshold,
            ids,
            matrix,
            groups,
        });
        progress(RunProgress::new(RunPhase::Complete, total, total));
        Ok(&outcome.groups)
    }

    /// Load and detect in one pass.
    pub fn run<I>(
        &mut self,
        sources: I,
        threshold: Threshold,
        progress: &mut dyn FnMut(RunProgress),
    ) -> Result<&[DuplicateGroup], EngineError>
    where
        I: IntoIterator<Item = SourceDocument>,
        I::IntoIter: ExactSizeIterator,
    {
        self.load(sources, progress)?;
        self.detect(threshold, progress)
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    pub fn similarity_matrix(&self) -> Option<&SimilarityMatrix> {
        self.outcome.as_ref().map(|outcome| &outcome.matrix)
    }

    pub fn document(&self, id: &DocumentId) -> Option<&Document> {
        self.corpus.get(id)
    }

    /// Forget a document whose backing file is gone. Groups from the last
    /// run stop listing it, but nothing is re-clustered until the next
    /// [`detect`](Self::detect).
    pub fn remove_document(&mut self, id: &DocumentId) -> Result<Document, EngineError> {
        let document = self
            .corpus
            .remove(id)
            .ok_or_else(|| EngineError::UnknownDocument {
                id: id.to_string(),
            })?;
        self.removed.insert(document.id.clone());
        Ok(document)
    }

    /// Groups of the last run with removed documents filtered out. A group
    /// left with fewer than two documents is no longer listed; summaries are
    /// as computed by the run.
    pub fn active_groups(&self) -> Vec<DuplicateGroup> {
        let Some(outcome) = &self.outcome else {
            return Vec::new();
        };

        outcome
            .groups
            .iter()
            .filter_map(|group| {
                let (members, ids): (Vec<usize>, Vec<DocumentId>) = group
                    .members
                    .iter()
                    .zip(&group.ids)
                    .filter(|(_, id)| !self.removed.contains(*id))
                    .map(|(&member, id)| (member, id.clone()))
                    .unzip();
                (ids.len() >= 2).then(|| DuplicateGroup {
                    members,
                    ids,
                    edge_weights: group.edge_weights.clone(),
                    similarity: group.similarity,
                })
            })
            .collect()
    }
}

impl Default for DuplicateEngine {
    fn default() -> Self {
        Self::new(Normalizer::default())
    }
}

/// Run `f()` and log how long it took under `label`.
fn timed<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    tracing::info!(elapsed = ?start.elapsed(), "{label}");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(texts: &[(&str, &str)]) -> Vec<SourceDocument> {
        texts
            .iter()
            .map(|(id, text)| SourceDocument::new(*id, *text))
            .collect()
    }

    #[test]
    fn load_reports_each_document() {
        let mut engine = DuplicateEngine::default();
        let mut seen = Vec::new();
        engine
            .load(sources(&[("a", "one"), ("b", "two")]), &mut |p| seen.push(p))
            .unwrap();
        assert_eq!(
            seen,
            vec![
                RunProgress::new(RunPhase::Normalizing, 0, 2),
                RunProgress::new(RunPhase::Normalizing, 1, 2),
                RunProgress::new(RunPhase::Normalizing, 2, 2),
            ]
        );
    }

    #[test]
    fn detect_reports_stages_in_order() {
        let mut engine = DuplicateEngine::default();
        let mut phases = Vec::new();
        engine
            .run(
                sources(&[("a", "cat sat mat"), ("b", "cat sat mat"), ("c", "dog")]),
                Threshold::default(),
                &mut |p| phases.push(p.phase),
            )
            .unwrap();
        phases.dedup();
        assert_eq!(
            phases,
            vec![
                RunPhase::Normalizing,
                RunPhase::Vectorizing,
                RunPhase::ComputingSimilarity,
                RunPhase::Clustering,
                RunPhase::Summarizing,
                RunPhase::Complete,
            ]
        );
    }

    #[test]
    fn cancelled_load_keeps_previous_corpus() {
        let mut engine = DuplicateEngine::default();
        engine
            .load(sources(&[("a", "one"), ("b", "two")]), &mut |_| {})
            .unwrap();

        let token = engine.cancellation_token();
        let result = engine.load(
            sources(&[("c", "three"), ("d", "four"), ("e", "five")]),
            &mut |p| {
                if p.processed == 1 {
                    token.store(true, Ordering::Relaxed);
                }
            },
        );
        assert_eq!(result, Err(EngineError::Cancelled));
        assert_eq!(
            engine.corpus().ids(),
            vec![DocumentId::from("a"), DocumentId::from("b")]
        );
    }

    #[test]
    fn cancellation_before_load_is_not_lost() {
        let mut engine = DuplicateEngine::default();
        engine.cancel();
        let result = engine.load(sources(&[("a", "one"), ("b", "two")]), &mut |_| {});
        assert_eq!(result, Err(EngineError::Cancelled));
        assert!(engine.corpus().is_empty());

        // The request was consumed; a retry goes through.
        let loaded = engine
            .load(sources(&[("a", "one"), ("b", "two")]), &mut |_| {})
            .unwrap();
        assert_eq!(loaded, 2);
    }

    #[test]
    fn cancelled_detect_keeps_outcome_and_clears_request() {
        let mut engine = DuplicateEngine::default();
        let notes = [("a", "cat sat mat"), ("b", "cat sat mat"), ("c", "cat sat mat")];
        let before = engine
            .run(sources(&notes), Threshold::default(), &mut |_| {})
            .unwrap()
            .to_vec();

        engine.cancel();
        engine.remove_document(&"c".into()).unwrap();
        let mut phases = Vec::new();
        let result = engine
            .detect(Threshold::default(), &mut |p| phases.push(p.phase))
            .map(<[DuplicateGroup]>::to_vec);
        assert_eq!(result, Err(EngineError::Cancelled));
        assert!(phases.is_empty());
        assert_eq!(engine.outcome().unwrap().groups, before);
        assert_eq!(engine.similarity_matrix().unwrap().len(), 3);

        let after = engine.detect(Threshold::default(), &mut |_| {}).unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].ids, vec![DocumentId::from("a"), DocumentId::from("b")]);
        assert_eq!(engine.similarity_matrix().unwrap().len(), 2);
    }

    #[test]
    fn detect_without_documents_is_insufficient() {
        let mut engine = DuplicateEngine::default();
        assert_eq!(
            engine.detect(Threshold::default(), &mut |_| {}).unwrap_err(),
            EngineError::InsufficientInput { found: 0 }
        );
        assert!(engine.outcome().is_none());
    }

    #[test]
    fn removing_unknown_document_fails() {
        let mut engine = DuplicateEngine::default();
        assert_eq!(
            engine.remove_document(&"ghost.md".into()).unwrap_err(),
            EngineError::UnknownDocument {
                id: "ghost.md".to_string()
            }
        );
    }

    #[test]
    fn removal_hides_member_without_reclustering() {
        let mut engine = DuplicateEngine::default();
        engine
            .run(
                sources(&[
                    ("a", "quarterly budget review"),
                    ("b", "quarterly budget review"),
                    ("c", "quarterly budget review"),
                ]),
                Threshold::default(),
                &mut |_| {},
            )
            .unwrap();

        engine.remove_document(&"b".into()).unwrap();
        let groups = engine.active_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].ids, vec![DocumentId::from("a"), DocumentId::from("c")]);
        assert_eq!(groups[0].similarity, 100.0);
        // The last run's matrix still covers the removed document.
        assert_eq!(engine.similarity_matrix().unwrap().len(), 3);

        engine.remove_document(&"c".into()).unwrap();
        assert!(engine.active_groups().is_empty());
    }
}
