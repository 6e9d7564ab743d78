//! Engine configuration.
//!
//! Every recognized option is enumerated here and threaded into the
//! models at construction time; there is no ambient global state.

/// Maximum number of vocabulary terms retained by the lexical model.
pub const DEFAULT_MAX_VOCABULARY: usize = 1000;

/// Characters of context kept on each side of a snippet match.
pub const DEFAULT_CONTEXT_WINDOW: usize = 200;

/// BM25 term-frequency saturation parameter.
pub const DEFAULT_BM25_K1: f32 = 1.2;

/// BM25 length-normalization parameter.
pub const DEFAULT_BM25_B: f32 = 0.75;

/// Maximum pages read from a paginated document during text extraction.
pub const DEFAULT_MAX_PAGES: usize = 10;

/// Token reduction applied after stopword filtering.
///
/// Stemming and lemmatization are mutually exclusive; stemming wins
/// when a caller asks for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizeMode {
    /// Snowball suffix stripping.
    #[default]
    Stemming,
    /// Rule-based reduction to dictionary form.
    Lemmatization,
    /// Keep filtered tokens as they are.
    None,
}

/// Relative weight of each retrieval model in fused ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub lexical: f32,
    pub probabilistic: f32,
    pub semantic: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            lexical: 0.30,
            probabilistic: 0.35,
            semantic: 0.35,
        }
    }
}

impl FusionWeights {
    /// Weights must describe a convex combination of the three models.
    pub fn is_normalized(&self) -> bool {
        (self.lexical + self.probabilistic + self.semantic - 1.0).abs() < 1e-6
    }
}

/// Options consumed by the cache manager and the retrieval models.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cap on lexical vocabulary size.
    pub max_vocabulary: usize,
    /// Token reduction mode shared by indexing and query processing.
    pub normalize_mode: NormalizeMode,
    /// Whether queries are augmented with synonyms before scoring.
    pub query_expansion: bool,
    /// Model weights used by fused search.
    pub fusion_weights: FusionWeights,
    /// Snippet context radius in characters.
    pub context_window: usize,
    pub bm25_k1: f32,
    pub bm25_b: f32,
    /// Page cap applied by paginated text extractors.
    pub max_pages_per_document: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_vocabulary: DEFAULT_MAX_VOCABULARY,
            normalize_mode: NormalizeMode::default(),
            query_expansion: true,
            fusion_weights: FusionWeights::default(),
            context_window: DEFAULT_CONTEXT_WINDOW,
            bm25_k1: DEFAULT_BM25_K1,
            bm25_b: DEFAULT_BM25_B,
            max_pages_per_document: DEFAULT_MAX_PAGES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_are_normalized() {
        assert!(FusionWeights::default().is_normalized());
    }

    #[test]
    fn unbalanced_weights_are_rejected() {
        let weights = FusionWeights {
            lexical: 0.5,
            probabilistic: 0.5,
            semantic: 0.5,
        };
        assert!(!weights.is_normalized());
    }

    #[test]
    fn default_mode_is_stemming() {
        let config = EngineConfig::default();
        assert_eq!(config.normalize_mode, NormalizeMode::Stemming);
        assert!(config.query_expansion);
        assert_eq!(config.max_vocabulary, DEFAULT_MAX_VOCABULARY);
    }
}
