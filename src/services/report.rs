//! Presentation of duplicate groups: relative paths, sizes, modification
//! times and which members are byte-identical copies.

use crate::core::summary::DuplicateGroup;
use crate::engine::DuplicateEngine;
use crate::services::hash::exact_copies;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub path: String,
    pub size: Option<String>,
    pub modified: Option<String>,
    /// Set when another member has the same bytes; members sharing a value
    /// are copies of each other.
    pub exact_copy: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub number: usize,
    pub similarity: f64,
    pub files: Vec<FileEntry>,
}

/// Describe `groups` for display. With `preview_lines > 0` each file carries
/// the leading lines of its original text.
pub fn build_reports(
    engine: &DuplicateEngine,
    groups: &[DuplicateGroup],
    root: &Path,
    preview_lines: usize,
) -> Vec<GroupReport> {
    groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let texts = group.ids.iter().map(|id| {
                engine
                    .document(id)
                    .map(|doc| doc.original_text.as_str())
                    .unwrap_or_default()
            });
            let mut copy_of = vec![None; group.len()];
            for (set, indices) in exact_copies(texts).into_iter().enumerate() {
                for index in indices {
                    copy_of[index] = Some(set + 1);
                }
            }

            let files = group
                .ids
                .iter()
                .zip(copy_of)
                .map(|(id, exact_copy)| {
                    let path = Path::new(id.as_str());
                    let (size, modified) = file_info(path);
                    let head = (preview_lines > 0)
                        .then(|| engine.document(id))
                        .flatten()
                        .map(|doc| preview(&doc.original_text, preview_lines));
                    FileEntry {
                        path: relative_display(path, root),
                        size,
                        modified,
                        exact_copy,
                        preview: head,
                    }
                })
                .collect();

            GroupReport {
                number: i + 1,
                similarity: group.similarity,
                files,
            }
        })
        .collect()
}

pub fn render_text(reports: &[GroupReport]) -> String {
    let mut out = String::new();
    for report in reports {
        out.push_str(&format!(
            "Group {} ({} files) - {:.2}% similar\n",
            report.number,
            report.files.len(),
            report.similarity
        ));
        for file in &report.files {
            out.push_str(&render_file(file));
        }
    }
    out
}

fn render_file(file: &FileEntry) -> String {
    let mut line = format!("   ▶ {}", file.path);
    if let (Some(size), Some(modified)) = (&file.size, &file.modified) {
        line.push_str(&format!("  [{size}, {modified}]"));
    }
    if let Some(set) = file.exact_copy {
        line.push_str(&format!("  (exact copy #{set})"));
    }
    line.push('\n');
    if let Some(preview) = &file.preview {
        line.push_str(preview);
    }
    line
}

/// First `lines` lines of a document's original text, indented for display.
pub fn preview(text: &str, lines: usize) -> String {
    text.lines()
        .take(lines)
        .map(|line| format!("      │ {line}\n"))
        .collect()
}

fn file_info(path: &Path) -> (Option<String>, Option<String>) {
    match fs::metadata(path) {
        Ok(meta) => {
            let size = Some(human_readable_size(meta.len()));
            let modified = meta.modified().ok().map(|time| {
                DateTime::<Local>::from(time)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            });
            (size, modified)
        }
        Err(_) => (None, None),
    }
}

fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

pub fn human_readable_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.2} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.2} TB")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Threshold;
    use crate::core::corpus::SourceDocument;
    use tempfile::TempDir;

    #[test]
    fn sizes_scale_by_1024() {
        assert_eq!(human_readable_size(0), "0.00 B");
        assert_eq!(human_readable_size(1023), "1023.00 B");
        assert_eq!(human_readable_size(1536), "1.50 KB");
        assert_eq!(human_readable_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(human_readable_size(1024u64.pow(4)), "1.00 TB");
    }

    #[test]
    fn preview_takes_leading_lines() {
        assert_eq!(preview("one\ntwo\nthree", 2), "      │ one\n      │ two\n");
        assert_eq!(preview("", 3), "");
    }

    #[test]
    fn reports_relative_paths_and_exact_copies() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let texts = [
            ("a.md", "The cat sat on the mat."),
            ("b.md", "The cat sat on the mat."),
            ("c.md", "The cat sat on the mat!"),
        ];
        let sources: Vec<SourceDocument> = texts
            .iter()
            .map(|(name, text)| {
                let path = root.join(name);
                fs::write(&path, text).unwrap();
                SourceDocument::new(path.as_path(), *text)
            })
            .collect();

        let mut engine = DuplicateEngine::default();
        let groups = engine
            .run(sources, Threshold::default(), &mut |_| {})
            .unwrap()
            .to_vec();
        let reports = build_reports(&engine, &groups, root, 1);

        assert_eq!(reports.len(), 1);
        let files = &reports[0].files;
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.md", "b.md", "c.md"]);
        assert_eq!(files[0].exact_copy, Some(1));
        assert_eq!(files[1].exact_copy, Some(1));
        assert_eq!(files[2].exact_copy, None);
        assert_eq!(files[0].size.as_deref(), Some("23.00 B"));
        assert_eq!(files[2].preview.as_deref(), Some("      │ The cat sat on the mat!\n"));

        let text = render_text(&reports);
        assert!(text.starts_with("Group 1 (3 files) - 100.00% similar\n"));
        assert!(text.contains("(exact copy #1)"));
        assert!(text.ends_with("      │ The cat sat on the mat!\n"));
    }

    #[test]
    fn renders_entries_without_metadata() {
        let reports = vec![GroupReport {
            number: 2,
            similarity: 83.333,
            files: vec![
                FileEntry {
                    path: "gone.md".to_string(),
                    size: None,
                    modified: None,
                    exact_copy: None,
                    preview: None,
                },
                FileEntry {
                    path: "kept.md".to_string(),
                    size: Some("1.00 KB".to_string()),
                    modified: Some("2024-01-02 03:04:05".to_string()),
                    exact_copy: Some(1),
                    preview: None,
                },
            ],
        }];
        assert_eq!(
            render_text(&reports),
            "Group 2 (2 files) - 83.33% similar\n   ▶ gone.md\n   ▶ kept.md  [1.00 KB, 2024-01-02 03:04:05]  (exact copy #1)\n"
        );
    }
}
