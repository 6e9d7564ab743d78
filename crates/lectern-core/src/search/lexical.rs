//! Lexical vector model: TF-IDF weights with cosine ranking.
//!
//! Vocabulary is capped at the highest-total-count terms, IDF is the
//! smoothed form `ln((1 + n) / (1 + df)) + 1`, and every row is
//! L2-normalized so cosine similarity reduces to a sparse dot product.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use super::types::{DocId, Document};

/// Sparse vector row: `(vocabulary column, weight)`, column-sorted.
pub type SparseRow = Vec<(u32, f32)>;

/// TF-IDF weighted document vectors over a capped vocabulary.
pub struct LexicalModel {
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
    rows: Vec<SparseRow>,
}

impl LexicalModel {
    /// Fits vocabulary, IDF weights and document rows.
    ///
    /// When the corpus holds more than `max_vocabulary` distinct terms,
    /// the highest-total-count terms win; ties resolve alphabetically.
    pub fn fit(documents: &[Document], max_vocabulary: usize) -> Self {
        let mut totals: HashMap<&str, u64> = HashMap::new();
        for doc in documents {
            for token in &doc.tokens {
                *totals.entry(token.as_str()).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<(&str, u64)> = totals.into_iter().collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(max_vocabulary);

        let mut selected: Vec<&str> = terms.into_iter().map(|(t, _)| t).collect();
        selected.sort_unstable();
        let vocabulary: HashMap<String, u32> = selected
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i as u32))
            .collect();

        let mut df = vec![0u32; vocabulary.len()];
        for doc in documents {
            let mut seen: HashSet<u32> = HashSet::new();
            for token in &doc.tokens {
                if let Some(&col) = vocabulary.get(token.as_str()) {
                    seen.insert(col);
                }
            }
            for col in seen {
                df[col as usize] += 1;
            }
        }

        let n = documents.len() as f32;
        let idf: Vec<f32> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f32)).ln() + 1.0)
            .collect();

        let rows = documents
            .iter()
            .map(|doc| vectorize(&doc.tokens, &vocabulary, &idf))
            .collect();

        Self {
            vocabulary,
            idf,
            rows,
        }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Cosine similarity of every document against a token stream.
    /// Tokens must come from the same normalizer that indexed the
    /// corpus, or they miss the vocabulary entirely.
    pub fn similarities(&self, tokens: &[String]) -> Vec<f32> {
        let query = vectorize(tokens, &self.vocabulary, &self.idf);
        self.rows.iter().map(|row| dot_sparse(&query, row)).collect()
    }

    /// Ranked `(DocId, similarity)` list: descending, ties broken by
    /// ordinal, exact-zero similarities excluded. An out-of-scope
    /// document's similarity is zeroed before ranking.
    pub fn search(&self, tokens: &[String], k: usize, mask: Option<&[bool]>) -> Vec<(DocId, f32)> {
        let mut sims = self.similarities(tokens);
        apply_mask(&mut sims, mask);
        rank_descending(&sims, k)
    }
}

fn vectorize(tokens: &[String], vocabulary: &HashMap<String, u32>, idf: &[f32]) -> SparseRow {
    let mut counts: HashMap<u32, f32> = HashMap::new();
    for token in tokens {
        if let Some(&col) = vocabulary.get(token.as_str()) {
            *counts.entry(col).or_insert(0.0) += 1.0;
        }
    }
    let mut row: SparseRow = counts
        .into_iter()
        .map(|(col, tf)| (col, tf * idf[col as usize]))
        .collect();
    row.sort_unstable_by_key(|&(col, _)| col);

    let norm = row.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for (_, w) in &mut row {
            *w /= norm;
        }
    }
    row
}

/// Merge-join dot product of two column-sorted sparse rows.
fn dot_sparse(a: &SparseRow, b: &SparseRow) -> f32 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// Zeroes scores of documents outside the scope mask.
pub(crate) fn apply_mask(scores: &mut [f32], mask: Option<&[bool]>) {
    if let Some(mask) = mask {
        for (score, &keep) in scores.iter_mut().zip(mask) {
            if !keep {
                *score = 0.0;
            }
        }
    }
}

/// Shared ranking: descending by score, equal scores sort by ordinal,
/// exact zeros dropped, truncated to `k`.
pub(crate) fn rank_descending(scores: &[f32], k: usize) -> Vec<(DocId, f32)> {
    let mut ranked: Vec<(DocId, f32)> = scores
        .iter()
        .enumerate()
        .filter(|(_, &s)| s != 0.0)
        .map(|(i, &s)| (DocId(i as u32), s))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::FileKind;

    fn doc(id: u32, tokens: &[&str]) -> Document {
        Document {
            id: DocId(id),
            path: format!("doc{id}.txt"),
            kind: FileKind::Text,
            size_bytes: 0,
            modified_secs: 0,
            text: String::new(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn to_tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn matching_document_ranks_first() {
        let docs = vec![
            doc(0, &["supervised", "learning", "labeled", "data"]),
            doc(1, &["database", "normalize", "table"]),
        ];
        let model = LexicalModel::fit(&docs, 1000);
        let hits = model.search(&to_tokens(&["supervised", "learning"]), 10, None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, DocId(0));
        assert!(hits[0].1 > 0.0);
    }

    #[test]
    fn zero_similarity_is_excluded() {
        let docs = vec![doc(0, &["alpha"]), doc(1, &["beta"])];
        let model = LexicalModel::fit(&docs, 1000);
        let hits = model.search(&to_tokens(&["alpha"]), 10, None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, DocId(0));
    }

    #[test]
    fn ties_break_by_ordinal() {
        let docs = vec![doc(0, &["shared"]), doc(1, &["shared"])];
        let model = LexicalModel::fit(&docs, 1000);
        let hits = model.search(&to_tokens(&["shared"]), 10, None);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, DocId(0));
        assert_eq!(hits[1].0, DocId(1));
        assert!((hits[0].1 - hits[1].1).abs() < 1e-6);
    }

    #[test]
    fn vocabulary_cap_keeps_most_frequent_terms() {
        let docs = vec![
            doc(0, &["common", "common", "common", "rare"]),
            doc(1, &["common", "other"]),
        ];
        let model = LexicalModel::fit(&docs, 1);
        assert_eq!(model.vocabulary_len(), 1);
        // only "common" survives, so a query for "rare" finds nothing
        assert!(model.search(&to_tokens(&["rare"]), 10, None).is_empty());
        assert_eq!(model.search(&to_tokens(&["common"]), 10, None).len(), 2);
    }

    #[test]
    fn vocabulary_cap_ties_resolve_alphabetically() {
        let docs = vec![doc(0, &["zeta", "alpha"])];
        let model = LexicalModel::fit(&docs, 1);
        assert_eq!(model.search(&to_tokens(&["alpha"]), 10, None).len(), 1);
        assert!(model.search(&to_tokens(&["zeta"]), 10, None).is_empty());
    }

    #[test]
    fn scope_mask_zeroes_out_documents() {
        let docs = vec![doc(0, &["shared"]), doc(1, &["shared"])];
        let model = LexicalModel::fit(&docs, 1000);
        let mask = vec![false, true];
        let hits = model.search(&to_tokens(&["shared"]), 10, Some(&mask));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, DocId(1));
    }

    #[test]
    fn single_doc_idf_weight_is_unit() {
        // idf = ln(2/2) + 1 = 1 and L2 normalization makes the single
        // component 1.0, so similarity for the exact term is 1.0
        let docs = vec![doc(0, &["only"])];
        let model = LexicalModel::fit(&docs, 1000);
        let hits = model.search(&to_tokens(&["only"]), 10, None);
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn repeated_terms_raise_similarity() {
        let docs = vec![
            doc(0, &["topic", "topic", "topic", "filler", "filler"]),
            doc(1, &["topic", "filler", "filler", "filler", "filler"]),
        ];
        let model = LexicalModel::fit(&docs, 1000);
        let hits = model.search(&to_tokens(&["topic"]), 10, None);
        assert_eq!(hits[0].0, DocId(0));
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn empty_corpus_returns_nothing() {
        let model = LexicalModel::fit(&[], 1000);
        assert!(model.search(&to_tokens(&["anything"]), 10, None).is_empty());
        assert_eq!(model.vocabulary_len(), 0);
    }
}
