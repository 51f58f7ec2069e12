//! Text normalization: the canonical token stream documents are compared on.
//!
//! Steps, in order: lower-case, delete ASCII punctuation (no substitution),
//! split on whitespace, drop stop words, rejoin with single spaces. The
//! output depends only on the input text and the stop-word set, and
//! normalizing already-normalized text returns it unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// NLTK's English stop-word list. Entries with apostrophes can never match
/// once punctuation has been stripped; they are kept so the set stays the
/// well-known one.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

static ENGLISH: LazyLock<StopWords> =
    LazyLock::new(|| StopWords::from_words(ENGLISH_STOP_WORDS.iter().copied()));

/// Which stop-word set a corpus is filtered with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    /// Keep every token.
    None,
}

impl Language {
    pub fn stop_words(self) -> StopWords {
        match self {
            Language::English => ENGLISH.clone(),
            Language::None => StopWords::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords(HashSet<String>);

impl StopWords {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(words.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    stop_words: StopWords,
}

impl Normalizer {
    pub fn new(stop_words: StopWords) -> Self {
        Self { stop_words }
    }

    pub fn for_language(language: Language) -> Self {
        Self::new(language.stop_words())
    }

    pub fn normalize(&self, text: &str) -> String {
        normalize_with(text, &self.stop_words)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::for_language(Language::English)
    }
}

/// Normalize with the English stop-word set.
pub fn normalize(text: &str) -> String {
    normalize_with(text, &ENGLISH)
}

fn normalize_with(text: &str, stop_words: &StopWords) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    stripped
        .split_whitespace()
        .filter(|token| !stop_words.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_list_has_nltk_size() {
        assert_eq!(Language::English.stop_words().len(), 179);
    }

    #[test]
    fn lowercases_strips_punctuation_and_stop_words() {
        assert_eq!(normalize("The cat sat on the mat."), "cat sat mat");
        assert_eq!(normalize("The cat sat on the mat!"), "cat sat mat");
    }

    #[test]
    fn punctuation_is_deleted_not_replaced() {
        assert_eq!(normalize("e-mail, co-op"), "email coop");
        assert_eq!(normalize("Don't stop"), "dont stop");
    }

    #[test]
    fn whitespace_collapses_to_single_spaces() {
        assert_eq!(normalize("  alpha\n\n\tbeta   gamma  "), "alpha beta gamma");
    }

    #[test]
    fn all_stop_words_normalize_to_empty() {
        assert_eq!(normalize("The and of it, is!"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "# Heading\n\nSome *markdown* with [links](http://x.y) and `code`.",
            "Ünïcode Wörds — and dashes…",
            "!!!",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn language_none_keeps_every_token() {
        let normalizer = Normalizer::for_language(Language::None);
        assert_eq!(normalizer.normalize("The cat."), "the cat");
    }

    #[test]
    fn custom_stop_words() {
        let normalizer = Normalizer::new(StopWords::from_words(["todo", "draft"]));
        assert_eq!(normalizer.normalize("TODO: draft the plan"), "the plan");
    }

    #[test]
    fn free_function_matches_default_normalizer() {
        let text = "Meeting notes: the budget, the plan and the people.";
        assert_eq!(Normalizer::default().normalize(text), normalize(text));
    }
}
