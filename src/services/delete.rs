//! Removing the files picked for deletion from one duplicate group.

use crate::core::corpus::DocumentId;
use crate::engine::DuplicateEngine;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct Removal {
    pub deleted: Vec<DocumentId>,
    pub failed: Vec<(DocumentId, io::Error)>,
    /// `stop` was raised before every file was handled.
    pub interrupted: bool,
}

impl Removal {
    /// Members of `group` still on disk after this removal.
    pub fn retained<'a>(&self, group: &'a [DocumentId]) -> Vec<&'a DocumentId> {
        group.iter().filter(|id| !self.deleted.contains(*id)).collect()
    }
}

/// Delete each file in `ids` and drop it from the engine. A file that cannot
/// be removed is logged and recorded in [`Removal::failed`]; the rest are
/// still processed. `stop` is checked before every file.
pub fn remove_files(engine: &mut DuplicateEngine, ids: &[DocumentId], stop: &AtomicBool) -> Removal {
    let mut removal = Removal::default();
    for id in ids {
        if stop.load(Ordering::Relaxed) {
            removal.interrupted = true;
            break;
        }

        let path = Path::new(id.as_str());
        match fs::remove_file(path) {
            Ok(()) => {
                if let Err(error) = engine.remove_document(id) {
                    tracing::debug!(%id, %error, "deleted file was not part of the corpus");
                }
                removal.deleted.push(id.clone());
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "could not delete file");
                removal.failed.push((id.clone(), error));
            }
        }
    }
    removal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Threshold;
    use crate::core::corpus::SourceDocument;
    use tempfile::TempDir;

    const NOTE: &str = "Quarterly budget review for the garden club";

    fn engine_for(paths: &[&Path]) -> DuplicateEngine {
        let sources: Vec<SourceDocument> = paths
            .iter()
            .map(|path| SourceDocument::new(*path, NOTE))
            .collect();
        let mut engine = DuplicateEngine::default();
        engine.run(sources, Threshold::default(), &mut |_| {}).unwrap();
        engine
    }

    #[test]
    fn failure_does_not_stop_the_rest() {
        let temp_dir = TempDir::new().unwrap();
        let kept = temp_dir.path().join("kept.md");
        let missing = temp_dir.path().join("missing.md");
        let extra = temp_dir.path().join("extra.md");
        fs::write(&kept, NOTE).unwrap();
        fs::write(&extra, NOTE).unwrap();

        let mut engine = engine_for(&[&kept, &missing, &extra]);
        let group = engine.active_groups()[0].ids.clone();
        let to_delete = vec![DocumentId::from(missing.as_path()), DocumentId::from(extra.as_path())];

        let removal = remove_files(&mut engine, &to_delete, &AtomicBool::new(false));

        assert!(!removal.interrupted);
        assert_eq!(removal.deleted, vec![DocumentId::from(extra.as_path())]);
        assert_eq!(removal.failed.len(), 1);
        assert_eq!(removal.failed[0].0, DocumentId::from(missing.as_path()));
        assert_eq!(removal.failed[0].1.kind(), io::ErrorKind::NotFound);
        assert!(!extra.exists());
        assert!(kept.exists());

        // The failed file is still listed with the one that was kept.
        assert_eq!(
            removal.retained(&group),
            vec![
                &DocumentId::from(kept.as_path()),
                &DocumentId::from(missing.as_path())
            ]
        );
        assert!(engine.document(&DocumentId::from(extra.as_path())).is_none());
        assert!(engine.document(&DocumentId::from(missing.as_path())).is_some());
    }

    #[test]
    fn stop_request_leaves_files_alone() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.md");
        let b = temp_dir.path().join("b.md");
        fs::write(&a, NOTE).unwrap();
        fs::write(&b, NOTE).unwrap();

        let mut engine = engine_for(&[&a, &b]);
        let removal = remove_files(
            &mut engine,
            &[DocumentId::from(b.as_path())],
            &AtomicBool::new(true),
        );

        assert!(removal.interrupted);
        assert!(removal.deleted.is_empty());
        assert!(removal.failed.is_empty());
        assert!(a.exists() && b.exists());
        assert_eq!(engine.active_groups().len(), 1);
    }
}
