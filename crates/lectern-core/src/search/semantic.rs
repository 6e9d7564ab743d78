//! Dense-vector similarity over document embeddings.
//!
//! The model is a plain row matrix. Rows are L2-normalized once at
//! construction, so a query similarity is a dot product divided by the
//! query norm alone.

use super::lexical::{apply_mask, rank_descending};
use super::types::DocId;

/// Document embedding matrix with cosine ranking.
pub struct SemanticModel {
    rows: Vec<Vec<f32>>,
}

impl SemanticModel {
    /// Wraps an embedding matrix, normalizing each row to unit length.
    /// Zero rows are left untouched and score 0 against every query.
    pub fn new(mut rows: Vec<Vec<f32>>) -> Self {
        for row in &mut rows {
            let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0.0 {
                for v in row.iter_mut() {
                    *v /= norm;
                }
            }
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    pub fn dim(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ranked top-`k` by cosine similarity to `query`.
    ///
    /// A zero-norm query has no direction and matches nothing. Exact-zero
    /// similarities are dropped from the ranking while negative ones are
    /// kept: opposing a query direction still carries signal.
    pub fn search(&self, query: &[f32], k: usize, mask: Option<&[bool]>) -> Vec<(DocId, f32)> {
        let qnorm = query.iter().map(|v| v * v).sum::<f32>().sqrt();
        if qnorm == 0.0 {
            return Vec::new();
        }

        let mut sims: Vec<f32> = self
            .rows
            .iter()
            .map(|row| {
                let dot: f32 = row.iter().zip(query.iter()).map(|(a, b)| a * b).sum();
                dot / qnorm
            })
            .collect();
        apply_mask(&mut sims, mask);
        rank_descending(&sims, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_unit_length_after_construction() {
        let model = SemanticModel::new(vec![vec![3.0, 4.0]]);
        let row = &model.rows()[0];
        let norm: f32 = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn identical_vector_ranks_first() {
        let model = SemanticModel::new(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.7, 0.7, 0.0],
        ]);
        let hits = model.search(&[1.0, 0.0, 0.0], 10, None);
        assert_eq!(hits[0].0, DocId(0));
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_query_matches_nothing() {
        let model = SemanticModel::new(vec![vec![1.0, 0.0]]);
        assert!(model.search(&[0.0, 0.0], 10, None).is_empty());
    }

    #[test]
    fn orthogonal_documents_are_excluded() {
        let model = SemanticModel::new(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let hits = model.search(&[1.0, 0.0], 10, None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, DocId(0));
    }

    #[test]
    fn negative_similarity_is_kept() {
        let model = SemanticModel::new(vec![vec![-1.0, 0.0], vec![1.0, 0.0]]);
        let hits = model.search(&[1.0, 0.0], 10, None);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, DocId(1));
        assert!(hits[1].1 < 0.0);
    }

    #[test]
    fn scope_mask_excludes_documents() {
        let model = SemanticModel::new(vec![vec![1.0, 0.0], vec![0.9, 0.1]]);
        let mask = vec![false, true];
        let hits = model.search(&[1.0, 0.0], 10, Some(&mask));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, DocId(1));
    }

    #[test]
    fn zero_rows_stay_zero() {
        let model = SemanticModel::new(vec![vec![0.0, 0.0], vec![1.0, 0.0]]);
        let hits = model.search(&[1.0, 0.0], 10, None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, DocId(1));
    }

    #[test]
    fn dim_reports_row_width() {
        let model = SemanticModel::new(vec![vec![0.0; 256]]);
        assert_eq!(model.dim(), 256);
        assert_eq!(model.len(), 1);
        assert!(!model.is_empty());
        assert_eq!(SemanticModel::new(Vec::new()).dim(), 0);
    }
}
