//! Core types shared across the retrieval engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::corpus::{CorpusError, FileKind, RawDocument};
use crate::storage::StorageError;

/// Position of a document within its index generation.
///
/// Ordinals are assigned in corpus-listing order at build time and are
/// only meaningful within one generation; they also break ranking ties
/// so equal scores sort deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

/// An indexed document with its normalized token stream.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    /// Path relative to the corpus root, `/`-separated.
    pub path: String,
    pub kind: FileKind,
    pub size_bytes: u64,
    pub modified_secs: i64,
    /// Raw extracted text, fed to the semantic encoder and snippets.
    pub text: String,
    /// Normalized tokens, fed to the lexical and probabilistic models.
    pub tokens: Vec<String>,
}

/// Which retrieval model answers a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Lexical,
    Probabilistic,
    Semantic,
    Fused,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lexical => "lexical",
            Self::Probabilistic => "probabilistic",
            Self::Semantic => "semantic",
            Self::Fused => "fused",
        }
    }
}

/// One ranked search result with display metadata and extracted
/// content. Component scores are present only on fused results.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredHit {
    pub doc_id: DocId,
    pub path: String,
    pub file_name: String,
    /// Parent directory of the document, or `"Root"`.
    pub folder: String,
    /// Display label such as `"TXT"` or `"PDF"`.
    pub file_type: String,
    pub score: f32,
    /// Model that produced `score`. Degraded semantic searches report
    /// the model that actually ranked them.
    pub method: SearchMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexical_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilistic_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_score: Option<f32>,
    pub summary: String,
    pub key_points: Vec<String>,
    /// Size display string, e.g. `"12.3 KB"`.
    pub file_size: String,
    /// Modified-date display string, e.g. `"2026-08-22"`.
    pub modified_date: String,
}

/// Current persisted snapshot schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Oldest snapshot schema this build can still load.
pub const MIN_COMPATIBLE_VERSION: u32 = 1;

/// Snapshot header, written after every other snapshot artifact so a
/// crash mid-save never leaves a validated manifest pointing at
/// missing data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub schema_version: u32,
    pub min_compatible_version: u32,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub document_count: usize,
    /// Digest of the corpus listing this snapshot was built from.
    pub fingerprint: String,
}

impl IndexManifest {
    pub fn new(document_count: usize, fingerprint: String) -> Self {
        let now = Utc::now();
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            min_compatible_version: MIN_COMPATIBLE_VERSION,
            created_at: now,
            last_modified: now,
            document_count,
            fingerprint,
        }
    }

    /// Whether this build can load a snapshot with this header.
    pub fn is_compatible(&self) -> bool {
        self.schema_version >= MIN_COMPATIBLE_VERSION
            && self.min_compatible_version <= CURRENT_SCHEMA_VERSION
    }
}

/// Document fields that survive a process restart. Tokens are not
/// persisted; the restore path re-normalizes the stored text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub path: String,
    pub kind: FileKind,
    pub size_bytes: u64,
    pub modified_secs: i64,
    pub text: String,
}

impl From<&Document> for StoredDocument {
    fn from(doc: &Document) -> Self {
        Self {
            path: doc.path.clone(),
            kind: doc.kind,
            size_bytes: doc.size_bytes,
            modified_secs: doc.modified_secs,
            text: doc.text.clone(),
        }
    }
}

impl From<StoredDocument> for RawDocument {
    fn from(stored: StoredDocument) -> Self {
        Self {
            rel_path: stored.path,
            kind: stored.kind,
            size_bytes: stored.size_bytes,
            modified_secs: stored.modified_secs,
            text: stored.text,
        }
    }
}

impl From<&Document> for RawDocument {
    fn from(doc: &Document) -> Self {
        Self {
            rel_path: doc.path.clone(),
            kind: doc.kind,
            size_bytes: doc.size_bytes,
            modified_secs: doc.modified_secs,
            text: doc.text.clone(),
        }
    }
}

/// Serialized document set for the snapshot.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PersistedDocuments {
    pub documents: Vec<StoredDocument>,
}

/// How the current index generation came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    /// Deserialized from a snapshot whose fingerprint matched.
    Restored,
    /// Built from the corpus files on disk.
    Rebuilt,
}

/// Errors surfaced by the retrieval engine.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Index is empty: add documents to the corpus first")]
    EmptyIndex,
    #[error("Ingestion error: {0}")]
    Ingestion(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_round_trips_through_json() {
        let manifest = IndexManifest::new(3, "abcd1234abcd1234".to_string());
        let bytes = serde_json::to_vec(&manifest).unwrap();
        let parsed: IndexManifest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.document_count, 3);
        assert_eq!(parsed.fingerprint, "abcd1234abcd1234");
        assert!(parsed.is_compatible());
    }

    #[test]
    fn future_schema_is_incompatible() {
        let mut manifest = IndexManifest::new(0, String::new());
        manifest.min_compatible_version = CURRENT_SCHEMA_VERSION + 1;
        manifest.schema_version = CURRENT_SCHEMA_VERSION + 1;
        assert!(!manifest.is_compatible());
    }

    #[test]
    fn method_labels_are_stable() {
        assert_eq!(SearchMethod::Lexical.as_str(), "lexical");
        assert_eq!(SearchMethod::Fused.as_str(), "fused");
        let json = serde_json::to_string(&SearchMethod::Probabilistic).unwrap();
        assert_eq!(json, "\"probabilistic\"");
    }

    #[test]
    fn doc_ids_order_by_ordinal() {
        assert!(DocId(0) < DocId(1));
        assert_eq!(DocId(7).as_usize(), 7);
    }
}
