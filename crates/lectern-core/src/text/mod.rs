//! Text normalization shared by the lexical and probabilistic models.
//!
//! `Normalizer::normalize` is pure: the same input yields the same
//! token stream on every call, and the same pipeline runs for both
//! document indexing and query processing. Anything less and the
//! models' vocabularies stop lining up with query tokens.

mod expand;

pub use expand::{QueryExpander, StaticSynonyms, SynonymProvider};

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

use crate::config::NormalizeMode;

/// Common English words carrying no retrieval signal.
const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "and", "any", "are",
    "because", "been", "before", "being", "below", "between", "both", "but", "can",
    "could", "did", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "into", "its", "itself", "just", "may", "might", "more",
    "most", "much", "must", "myself", "nor", "not", "now", "off", "once", "only",
    "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should",
    "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves",
    "then", "there", "these", "they", "this", "those", "through", "too", "under",
    "until", "very", "was", "were", "what", "when", "where", "which", "while", "who",
    "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Document-structure words that add noise in study material.
const NOISE_WORDS: &[&str] = &[
    "note", "notes", "question", "answer", "section", "unit", "page",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOPWORDS.iter().chain(NOISE_WORDS).copied().collect());

static NON_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s]").expect("valid regex"));

/// Deterministic token pipeline: lowercase, strip punctuation, drop
/// short and stopword tokens, then reduce per the configured mode.
pub struct Normalizer {
    mode: NormalizeMode,
    stemmer: Stemmer,
}

impl Normalizer {
    pub fn new(mode: NormalizeMode) -> Self {
        Self {
            mode,
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Tokenizes `text` into the normalized stream the models index.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let cleaned = NON_ALNUM.replace_all(&lowered, " ");
        cleaned
            .split_whitespace()
            .filter(|t| t.len() > 2 && !STOPWORD_SET.contains(t))
            .map(|t| self.reduce(t))
            .collect()
    }

    fn reduce(&self, token: &str) -> String {
        match self.mode {
            NormalizeMode::Stemming => self.stemmer.stem(token).into_owned(),
            NormalizeMode::Lemmatization => lemmatize(token),
            NormalizeMode::None => token.to_string(),
        }
    }
}

/// Rule-based reduction to dictionary form.
///
/// Covers regular noun plurals only; irregular forms other than
/// `-men` pass through unchanged. Retrieval needs consistency between
/// document and query tokens, not linguistic completeness.
fn lemmatize(token: &str) -> String {
    if token.len() > 3 {
        if let Some(stem) = token.strip_suffix("ies") {
            return format!("{stem}y");
        }
        if let Some(stem) = token.strip_suffix("es") {
            if stem.ends_with('x')
                || stem.ends_with('z')
                || stem.ends_with("ch")
                || stem.ends_with("sh")
                || stem.ends_with("ss")
            {
                return stem.to_string();
            }
        }
        if let Some(stem) = token.strip_suffix("men") {
            return format!("{stem}man");
        }
        if let Some(stem) = token.strip_suffix('s') {
            if !stem.ends_with('s') {
                return stem.to_string();
            }
        }
    }
    token.to_string()
}
