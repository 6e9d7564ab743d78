//! Weighted late fusion of per-model rankings.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::FusionWeights;

use super::types::DocId;

/// Combined score with the per-model contributions that produced it.
///
/// A `None` component means the model never ranked the document, which
/// is distinct from ranking it at 0.0.
#[derive(Debug, Clone, Default)]
pub struct FusedScore {
    pub fused: f32,
    pub lexical: Option<f32>,
    pub probabilistic: Option<f32>,
    pub semantic: Option<f32>,
}

/// Merges three candidate lists into one ranking.
///
/// Each document's fused score is the weighted sum of the scores from
/// the lists that mention it; missing mentions contribute nothing.
/// Callers pass candidate lists deeper than `k` so a document strong in
/// one model but mid-list in another is not cut before fusion.
pub fn fuse(
    lexical: &[(DocId, f32)],
    probabilistic: &[(DocId, f32)],
    semantic: &[(DocId, f32)],
    weights: &FusionWeights,
    k: usize,
) -> Vec<(DocId, FusedScore)> {
    let mut combined: HashMap<DocId, FusedScore> = HashMap::new();

    for &(id, s) in lexical {
        let entry = combined.entry(id).or_default();
        entry.fused += weights.lexical * s;
        entry.lexical = Some(s);
    }
    for &(id, s) in probabilistic {
        let entry = combined.entry(id).or_default();
        entry.fused += weights.probabilistic * s;
        entry.probabilistic = Some(s);
    }
    for &(id, s) in semantic {
        let entry = combined.entry(id).or_default();
        entry.fused += weights.semantic * s;
        entry.semantic = Some(s);
    }

    let mut ranked: Vec<(DocId, FusedScore)> = combined.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.fused
            .partial_cmp(&a.1.fused)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(k);
    ranked
}
