//! Multi-signal retrieval.
//!
//! Three scoring models rank documents independently: [`lexical`]
//! (TF-IDF cosine), [`probabilistic`] (BM25) and [`semantic`] (dense
//! cosine over provider embeddings). [`fusion`] combines their rankings
//! under fixed weights, and [`engine`] owns the index lifecycle that
//! feeds them. Rankings agree on one contract: `(DocId, score)` pairs,
//! best first, ties broken by document ordinal.

pub mod engine;
pub mod fusion;
pub mod index;
pub mod lexical;
pub mod probabilistic;
pub mod semantic;
pub mod snippet;
pub mod types;

pub use engine::RetrievalEngine;
pub use types::{DocId, IndexOrigin, ScoredHit, SearchError, SearchMethod};
