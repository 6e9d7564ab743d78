//! One immutable index generation.
//!
//! An [`Index`] is built from a corpus snapshot and never mutated
//! afterwards; corpus changes produce a whole new generation that the
//! engine swaps in atomically. Queries therefore read without locks.

use crate::config::EngineConfig;
use crate::corpus::{RawDocument, SkippedFile};
use crate::text::Normalizer;

use super::lexical::LexicalModel;
use super::probabilistic::ProbabilisticModel;
use super::semantic::SemanticModel;
use super::types::{DocId, Document};

/// Documents plus the three fitted retrieval models.
pub struct Index {
    pub documents: Vec<Document>,
    pub lexical: LexicalModel,
    pub probabilistic: ProbabilisticModel,
    /// Present only when an embedding provider supplied vectors.
    pub semantic: Option<SemanticModel>,
    /// Fingerprint of the corpus listing this generation was built from.
    pub fingerprint: String,
    /// Files the corpus reader could not ingest.
    pub skipped: Vec<SkippedFile>,
}

impl Index {
    /// Tokenizes every document and fits the lexical and probabilistic
    /// models. The semantic model starts absent; the engine attaches it
    /// after encoding succeeds.
    pub fn build(
        raw: Vec<RawDocument>,
        skipped: Vec<SkippedFile>,
        fingerprint: String,
        config: &EngineConfig,
        normalizer: &Normalizer,
    ) -> Self {
        let documents: Vec<Document> = raw
            .into_iter()
            .enumerate()
            .map(|(i, doc)| {
                let tokens = normalizer.normalize(&doc.text);
                Document {
                    id: DocId(i as u32),
                    path: doc.rel_path,
                    kind: doc.kind,
                    size_bytes: doc.size_bytes,
                    modified_secs: doc.modified_secs,
                    text: doc.text,
                    tokens,
                }
            })
            .collect();

        let lexical = LexicalModel::fit(&documents, config.max_vocabulary);
        let probabilistic = ProbabilisticModel::fit(&documents, config.bm25_k1, config.bm25_b);

        Self {
            documents,
            lexical,
            probabilistic,
            semantic: None,
            fingerprint,
            skipped,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Per-document mask for a path scope, or `None` when the scope is
    /// empty and no filtering applies.
    ///
    /// A document is in scope when its path equals an entry exactly or
    /// sits below it, with either separator style counting as "below".
    pub fn scope_mask(&self, scope: &[String]) -> Option<Vec<bool>> {
        if scope.is_empty() {
            return None;
        }
        Some(
            self.documents
                .iter()
                .map(|doc| scope.iter().any(|entry| path_in_scope(&doc.path, entry)))
                .collect(),
        )
    }
}

fn path_in_scope(path: &str, entry: &str) -> bool {
    match path.strip_prefix(entry) {
        Some("") => true,
        Some(rest) => rest.starts_with('/') || rest.starts_with('\\'),
        None => false,
    }
}
