use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// BLAKE3 digest of a document's original bytes, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentDigest(pub String);

impl ContentDigest {
    pub fn of(text: &str) -> Self {
        Self(blake3::hash(text.as_bytes()).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Split `texts` into sets of byte-identical entries, by index. Only sets
/// with two or more entries are returned, ordered by their first index.
pub fn exact_copies<'a, I>(texts: I) -> Vec<Vec<usize>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut by_digest: BTreeMap<ContentDigest, Vec<usize>> = BTreeMap::new();
    for (index, text) in texts.into_iter().enumerate() {
        by_digest.entry(ContentDigest::of(text)).or_default().push(index);
    }

    let mut copies: Vec<Vec<usize>> = by_digest
        .into_values()
        .filter(|indices| indices.len() > 1)
        .collect();
    copies.sort_by_key(|indices| indices[0]);
    copies
}
