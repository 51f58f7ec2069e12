//! Near-duplicate detection for folders of plain-text notes.
//!
//! Raw documents are normalized, turned into TF-IDF vectors, compared
//! pairwise by cosine similarity and grouped into connected components of
//! the threshold graph. [`DuplicateEngine`] drives one run end to end; the
//! [`services`] module holds the file-system, presentation and deletion
//! collaborators used by the `notedup` binary.

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod services;

pub use crate::config::Threshold;
pub use crate::core::corpus::{Corpus, Document, DocumentId, SourceDocument};
pub use crate::core::normalize::{Language, Normalizer, StopWords, normalize};
pub use crate::core::similarity::SimilarityMatrix;
pub use crate::core::summary::DuplicateGroup;
pub use crate::engine::{DuplicateEngine, RunOutcome, RunPhase, RunProgress};
pub use crate::error::{EngineError, ReadError, ReadFailure, ScanError};
