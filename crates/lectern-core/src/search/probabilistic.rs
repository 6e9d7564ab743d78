//! Probabilistic model: Okapi BM25.
//!
//! Scoring uses the classic signed IDF `ln((n - df + 0.5) / (df + 0.5))`
//! with no positivity floor, so terms present in most documents push
//! scores negative. Unlike the vector models, zero- and negative-scoring
//! documents stay in the candidate set: the absence of a query term is
//! itself informative relative to other near-zero scores.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::types::{DocId, Document};

/// BM25 corpus statistics and scoring.
pub struct ProbabilisticModel {
    doc_freq: HashMap<String, u32>,
    doc_term_counts: Vec<HashMap<String, u32>>,
    doc_lens: Vec<u32>,
    avgdl: f32,
    k1: f32,
    b: f32,
}

impl ProbabilisticModel {
    pub fn fit(documents: &[Document], k1: f32, b: f32) -> Self {
        let mut doc_freq: HashMap<String, u32> = HashMap::new();
        let mut doc_term_counts = Vec::with_capacity(documents.len());
        let mut doc_lens = Vec::with_capacity(documents.len());

        for doc in documents {
            let mut counts: HashMap<String, u32> = HashMap::new();
            for token in &doc.tokens {
                *counts.entry(token.clone()).or_insert(0) += 1;
            }
            for term in counts.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            doc_lens.push(doc.tokens.len() as u32);
            doc_term_counts.push(counts);
        }

        let avgdl = if doc_lens.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<u32>() as f32 / doc_lens.len() as f32
        };

        Self {
            doc_freq,
            doc_term_counts,
            doc_lens,
            avgdl,
            k1,
            b,
        }
    }

    /// Raw BM25 score of every document for a query token multiset.
    pub fn scores(&self, query_tokens: &[String]) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.doc_term_counts.len()];
        if self.doc_term_counts.is_empty() || self.avgdl == 0.0 {
            return scores;
        }

        let n = self.doc_term_counts.len() as f32;
        for term in query_tokens {
            let Some(&df) = self.doc_freq.get(term) else {
                continue;
            };
            let idf = ((n - df as f32 + 0.5) / (df as f32 + 0.5)).ln();
            for (i, counts) in self.doc_term_counts.iter().enumerate() {
                let tf = counts.get(term).copied().unwrap_or(0) as f32;
                if tf == 0.0 {
                    continue;
                }
                let dl = self.doc_lens[i] as f32;
                let denom = tf + self.k1 * (1.0 - self.b + self.b * dl / self.avgdl);
                scores[i] += idf * (tf * (self.k1 + 1.0)) / denom;
            }
        }
        scores
    }

    /// Ranked top-`k` over all in-scope documents.
    ///
    /// Scope filtering removes a document from the candidate set rather
    /// than zeroing it, since zero does not mean "worst" here. Emitted
    /// scores divide by the maximum among the selected top-`k`,
    /// substituting 1.0 when that maximum is not positive, so the best
    /// hit reports roughly 1.0 regardless of corpus-absolute magnitude.
    pub fn search(&self, query_tokens: &[String], k: usize, mask: Option<&[bool]>) -> Vec<(DocId, f32)> {
        let scores = self.scores(query_tokens);
        let mut ranked: Vec<(DocId, f32)> = scores
            .iter()
            .enumerate()
            .filter(|(i, _)| mask.map_or(true, |m| m[*i]))
            .map(|(i, &s)| (DocId(i as u32), s))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(k);

        let max = ranked.first().map(|&(_, s)| s).unwrap_or(0.0);
        let denom = if max > 0.0 { max } else { 1.0 };
        ranked.into_iter().map(|(id, s)| (id, s / denom)).collect()
    }
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
    fn matching_document_outranks_non_matching() {
        // three documents keep df below n/2, so the idf stays positive
        let docs = vec![
            doc(0, &["supervised", "learning", "labeled", "data"]),
            doc(1, &["database", "normalize", "table", "redundancy"]),
            doc(2, &["packet", "switching", "routes", "frames"]),
        ];
        let model = ProbabilisticModel::fit(&docs, 1.2, 0.75);
        let hits = model.search(&to_tokens(&["supervised", "learning"]), 10, None);
        assert_eq!(hits[0].0, DocId(0));
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn all_documents_remain_candidates() {
        let docs = vec![doc(0, &["alpha"]), doc(1, &["beta"]), doc(2, &["gamma"])];
        let model = ProbabilisticModel::fit(&docs, 1.2, 0.75);
        // "alpha" scores zero for two documents, but both still appear
        let hits = model.search(&to_tokens(&["alpha"]), 10, None);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].0, DocId(0));
        assert_eq!(hits[1].1, 0.0);
        assert_eq!(hits[2].1, 0.0);
    }

    #[test]
    fn best_hit_normalizes_to_one() {
        let docs = vec![
            doc(0, &["topic", "topic", "filler"]),
            doc(1, &["topic", "filler", "filler"]),
            doc(2, &["filler", "filler", "filler"]),
            doc(3, &["other", "other", "other"]),
            doc(4, &["other", "other", "other"]),
        ];
        let model = ProbabilisticModel::fit(&docs, 1.2, 0.75);
        let hits = model.search(&to_tokens(&["topic"]), 10, None);
        assert_eq!(hits[0].0, DocId(0));
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
        assert!(hits[1].1 > 0.0);
        assert!(hits[1].1 < 1.0);
    }

    #[test]
    fn ubiquitous_terms_score_negative() {
        // df == n makes idf = ln(0.5 / (n + 0.5)) < 0
        let docs = vec![doc(0, &["everywhere"]), doc(1, &["everywhere"])];
        let model = ProbabilisticModel::fit(&docs, 1.2, 0.75);
        let hits = model.search(&to_tokens(&["everywhere"]), 10, None);
        assert_eq!(hits.len(), 2);
        // max is negative, so the 1.0 substitute keeps raw magnitudes
        assert!(hits[0].1 < 0.0);
        assert!(hits[1].1 < 0.0);
        // ties break by ordinal
        assert_eq!(hits[0].0, DocId(0));
    }

    #[test]
    fn shorter_documents_score_higher_at_equal_tf() {
        let docs = vec![
            doc(0, &["topic", "filler", "filler", "filler", "filler", "filler"]),
            doc(1, &["topic", "filler"]),
            doc(2, &["other", "other"]),
            doc(3, &["other", "other"]),
            doc(4, &["other", "other"]),
        ];
        let model = ProbabilisticModel::fit(&docs, 1.2, 0.75);
        let hits = model.search(&to_tokens(&["topic"]), 10, None);
        assert_eq!(hits[0].0, DocId(1));
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn scope_restricts_the_candidate_set() {
        let docs = vec![doc(0, &["shared"]), doc(1, &["shared"]), doc(2, &["shared"])];
        let model = ProbabilisticModel::fit(&docs, 1.2, 0.75);
        let mask = vec![false, true, true];
        let hits = model.search(&to_tokens(&["shared"]), 10, Some(&mask));
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|(id, _)| *id != DocId(0)));
    }

    #[test]
    fn unknown_terms_yield_all_zero_scores() {
        let docs = vec![doc(0, &["alpha"]), doc(1, &["beta"])];
        let model = ProbabilisticModel::fit(&docs, 1.2, 0.75);
        let hits = model.search(&to_tokens(&["nowhere"]), 10, None);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|&(_, s)| s == 0.0));
    }

    #[test]
    fn empty_corpus_returns_nothing() {
        let model = ProbabilisticModel::fit(&[], 1.2, 0.75);
        assert!(model.search(&to_tokens(&["anything"]), 10, None).is_empty());
    }

    #[test]
    fn top_k_truncates() {
        let docs: Vec<Document> = (0..10).map(|i| doc(i, &["common"])).collect();
        let model = ProbabilisticModel::fit(&docs, 1.2, 0.75);
        let hits = model.search(&to_tokens(&["common"]), 3, None);
        assert_eq!(hits.len(), 3);
    }
}
