use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("need at least two documents to find duplicates, found {found}")]
    InsufficientInput { found: usize },

    #[error("invalid similarity threshold: {value}")]
    InvalidThreshold { value: f64 },

    #[error("unknown document: {id}")]
    UnknownDocument { id: String },

    #[error("operation cancelled")]
    Cancelled,
}

/// Why a single document could not be loaded.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file is not valid UTF-8")]
    NotUtf8,
}

/// A document that was skipped during scanning. Never fails the run.
#[derive(Debug)]
pub struct ReadFailure {
    pub path: PathBuf,
    pub error: ReadError,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
