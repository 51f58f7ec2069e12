//! TF-IDF feature vectors for a whole corpus.
//!
//! Built in two passes over the normalized texts:
//!
//! 1. count terms per document and the number of documents each term occurs in;
//! 2. weight every count by the smoothed inverse document frequency
//!    `ln((1 + n) / (1 + df)) + 1` and scale each row to unit length.
//!
//! Terms are maximal runs of word characters (alphanumeric or `_`) at least
//! two characters long. Columns follow sorted term order, so the layout is a
//! pure function of the corpus. Nothing is kept between runs.

use crate::error::EngineError;
use std::collections::{BTreeMap, HashMap};

/// Sorted term -> column mapping for one corpus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    columns: BTreeMap<String, usize>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, term: &str) -> Option<usize> {
        self.columns.get(term).copied()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

/// A row of the feature matrix: `(column, weight)` pairs sorted by column,
/// zero weights omitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, column: usize) -> f64 {
        self.entries
            .binary_search_by_key(&column, |&(c, _)| c)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut a, mut b) = (self.entries.iter().peekable(), other.entries.iter().peekable());
        let mut sum = 0.0;
        while let (Some(&&(ca, wa)), Some(&&(cb, wb))) = (a.peek(), b.peek()) {
            match ca.cmp(&cb) {
                std::cmp::Ordering::Less => {
                    a.next();
                }
                std::cmp::Ordering::Greater => {
                    b.next();
                }
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    a.next();
                    b.next();
                }
            }
        }
        sum
    }
}

/// Documents x vocabulary TF-IDF matrix.
#[derive(Debug, Clone)]
pub struct TfIdfMatrix {
    vocabulary: Vocabulary,
    rows: Vec<SparseVector>,
}

impl TfIdfMatrix {
    /// Fit on `texts`, one row per text in the given order.
    pub fn fit<S: AsRef<str>>(texts: &[S]) -> Result<Self, EngineError> {
        if texts.len() < 2 {
            return Err(EngineError::InsufficientInput { found: texts.len() });
        }

        // Pass 1: term counts and document frequencies.
        let counts: Vec<HashMap<&str, usize>> = texts
            .iter()
            .map(|text| {
                let mut tf = HashMap::new();
                for term in terms(text.as_ref()) {
                    *tf.entry(term).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for tf in &counts {
            for term in tf.keys() {
                *document_frequency.entry(*term).or_insert(0) += 1;
            }
        }

        let n = texts.len() as f64;
        let columns: BTreeMap<String, usize> = document_frequency
            .keys()
            .enumerate()
            .map(|(column, term)| (term.to_string(), column))
            .collect();
        let idf: Vec<f64> = document_frequency
            .values()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        // Pass 2: weight and L2-normalize.
        let rows = counts
            .iter()
            .map(|tf| {
                let mut entries: Vec<(usize, f64)> = tf
                    .iter()
                    .map(|(term, &count)| {
                        let column = columns[*term];
                        (column, count as f64 * idf[column])
                    })
                    .collect();
                entries.sort_unstable_by_key(|&(column, _)| column);

                let norm = entries.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, weight) in &mut entries {
                        *weight /= norm;
                    }
                }
                SparseVector { entries }
            })
            .collect();

        Ok(Self {
            vocabulary: Vocabulary { columns },
            rows,
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &SparseVector {
        &self.rows[index]
    }

    /// Number of documents.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Vector dimensionality, one per distinct term in the corpus.
    pub fn n_cols(&self) -> usize {
        self.vocabulary.len()
    }
}

fn terms(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|term| term.chars().nth(1).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn single_document_is_insufficient() {
        let err = TfIdfMatrix::fit(&["cat sat mat"]).unwrap_err();
        assert_eq!(err, EngineError::InsufficientInput { found: 1 });
    }

    #[test]
    fn vocabulary_is_sorted_and_shared() {
        let matrix = TfIdfMatrix::fit(&["zebra apple", "mango apple"]).unwrap();
        let terms: Vec<&str> = matrix.vocabulary().terms().collect();
        assert_eq!(terms, vec!["apple", "mango", "zebra"]);
        assert_eq!(matrix.n_cols(), 3);
        assert_eq!(matrix.n_rows(), 2);
    }

    #[test]
    fn single_character_tokens_are_not_terms() {
        let matrix = TfIdfMatrix::fit(&["x y plan", "plan z"]).unwrap();
        assert_eq!(matrix.n_cols(), 1);
        assert_eq!(matrix.vocabulary().column("plan"), Some(0));
    }

    #[test]
    fn rows_are_unit_length() {
        let matrix = TfIdfMatrix::fit(&["alpha beta beta", "beta gamma", "delta"]).unwrap();
        for row in matrix.rows() {
            assert!(approx(row.norm(), 1.0));
        }
    }

    #[test]
    fn common_terms_weigh_less_than_rare_ones() {
        let matrix = TfIdfMatrix::fit(&["shared rare", "shared other", "shared third"]).unwrap();
        let vocab = matrix.vocabulary();
        let row = matrix.row(0);
        let shared = row.get(vocab.column("shared").unwrap());
        let rare = row.get(vocab.column("rare").unwrap());
        assert!(rare > shared);
    }

    #[test]
    fn matches_smoothed_idf_weights() {
        // n = 2; "cat" df = 2 -> idf 1; "dog" df = 1 -> idf ln(1.5) + 1.
        let matrix = TfIdfMatrix::fit(&["cat dog", "cat"]).unwrap();
        let idf_dog = (3.0f64 / 2.0).ln() + 1.0;
        let norm = (1.0 + idf_dog * idf_dog).sqrt();
        let row = matrix.row(0);
        assert!(approx(row.get(0), 1.0 / norm));
        assert!(approx(row.get(1), idf_dog / norm));
        assert!(approx(matrix.row(1).get(0), 1.0));
    }

    #[test]
    fn empty_document_has_zero_vector() {
        let matrix = TfIdfMatrix::fit(&["", "cat sat"]).unwrap();
        assert!(matrix.row(0).is_zero());
        assert_eq!(matrix.row(0).norm(), 0.0);
    }

    #[test]
    fn dot_product_only_counts_shared_columns() {
        let a = SparseVector {
            entries: vec![(0, 1.0), (2, 2.0), (5, 3.0)],
        };
        let b = SparseVector {
            entries: vec![(1, 4.0), (2, 5.0), (5, 6.0)],
        };
        assert!(approx(a.dot(&b), 2.0 * 5.0 + 3.0 * 6.0));
        assert!(approx(a.dot(&SparseVector::default()), 0.0));
    }
}
