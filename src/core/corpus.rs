use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Stable, path-like identifier of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&Path> for DocumentId {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

/// Raw input handed to the engine by whoever read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub id: DocumentId,
    pub text: String,
}

impl SourceDocument {
    pub fn new(id: impl Into<DocumentId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub original_text: String,
    pub normalized_text: String,
}

impl Document {
    /// True when nothing survived normalization; such a document has a zero
    /// vector and can never join a group.
    pub fn is_degenerate(&self) -> bool {
        self.normalized_text.is_empty()
    }
}

/// Ordered documents for one run. Positions index the similarity matrix.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|doc| &doc.id == id)
    }

    pub fn position(&self, id: &DocumentId) -> Option<usize> {
        self.documents.iter().position(|doc| &doc.id == id)
    }

    pub fn remove(&mut self, id: &DocumentId) -> Option<Document> {
        let index = self.position(id)?;
        Some(self.documents.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn ids(&self) -> Vec<DocumentId> {
        self.documents.iter().map(|doc| doc.id.clone()).collect()
    }

    pub fn normalized_texts(&self) -> Vec<&str> {
        self.documents
            .iter()
            .map(|doc| doc.normalized_text.as_str())
            .collect()
    }

    pub fn degenerate_count(&self) -> usize {
        self.documents.iter().filter(|doc| doc.is_degenerate()).count()
    }
}
