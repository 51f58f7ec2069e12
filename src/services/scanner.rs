use crate::core::corpus::{DocumentId, SourceDocument};
use crate::error::{ReadError, ReadFailure, ScanError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOptions {
    pub extensions: Vec<String>,
    pub follow_links: bool,
    pub include_hidden: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string()],
            follow_links: false,
            include_hidden: false,
        }
    }
}

impl ScanOptions {
    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(&ext))
            })
    }
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub documents: Vec<SourceDocument>,
    pub failures: Vec<ReadFailure>,
}

/// Recursively collect matching files under `root` and read them in
/// parallel. Unreadable files are skipped and reported in
/// [`ScanReport::failures`]; discovery order is by file name.
pub fn scan_documents(root: &Path, options: &ScanOptions) -> Result<ScanReport, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::InvalidPath {
            path: root.to_string_lossy().to_string(),
        });
    }

    let paths = discover_files(root, options)?;
    tracing::info!(files = paths.len(), root = %root.display(), "discovered documents");

    let results: Vec<(PathBuf, Result<String, ReadError>)> = paths
        .into_par_iter()
        .map(|path| {
            let text = read_document(&path);
            (path, text)
        })
        .collect();

    let mut report = ScanReport::default();
    for (path, result) in results {
        match result {
            Ok(text) => report.documents.push(SourceDocument {
                id: DocumentId::from(path.as_path()),
                text,
            }),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping unreadable document");
                report.failures.push(ReadFailure { path, error });
            }
        }
    }
    Ok(report)
}

fn discover_files(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(options.follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| options.include_hidden || entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Permission problems below the root lose one subtree, not the scan.
            Err(err) if err.depth() > 0 => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        if entry.file_type().is_file() && options.matches(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn read_document(path: &Path) -> Result<String, ReadError> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|_| ReadError::NotUtf8)
}
