use crate::error::HistoryError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

pub const HISTORY_FILE: &str = ".history.jsonl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionRecord {
    pub timestamp: String,
    pub retained: Vec<String>,
    pub deleted: Vec<String>,
    pub similarity: f64,
}

impl DeletionRecord {
    pub fn now(retained: Vec<String>, deleted: Vec<String>, similarity: f64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            retained,
            deleted,
            similarity,
        }
    }
}

pub fn history_path(root: &Path) -> PathBuf {
    root.join(HISTORY_FILE)
}

/// Append one record as a JSON line to `<root>/.history.jsonl`.
pub fn append(root: &Path, record: &DeletionRecord) -> Result<(), HistoryError> {
    let mut out = OpenOptions::new()
        .create(true)
        .append(true)
        .open(history_path(root))?;
    writeln!(out, "{}", serde_json::to_string(record)?)?;
    Ok(())
}

/// Read every well-formed record; malformed lines are logged and skipped.
pub fn load(root: &Path) -> Result<Vec<DeletionRecord>, HistoryError> {
    let reader = BufReader::new(File::open(history_path(root))?);
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<DeletionRecord>(&line) {
            Ok(record) => records.push(record),
            Err(err) => tracing::warn!(entry = i, error = %err, "skipping malformed history entry"),
        }
    }
    Ok(records)
}
