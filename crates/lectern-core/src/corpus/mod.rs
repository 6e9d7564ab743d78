//! Corpus enumeration and document loading.
//!
//! The corpus is a directory tree of plain-text-bearing files. Scanning
//! yields a deterministic, path-sorted listing; loading extracts text
//! with a skip-and-continue policy so one bad file never aborts a build.

mod fingerprint;

pub use fingerprint::{compute_fingerprint, fingerprint_corpus};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

/// Broad classification of an indexable file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    Text,
    Markdown,
    Pdf,
}

impl FileKind {
    /// Classifies by extension; `None` means the file is not indexable.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Text),
            "md" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Short display label, e.g. `"PDF"`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "TXT",
            Self::Markdown => "MD",
            Self::Pdf => "PDF",
        }
    }
}

/// A file discovered during corpus enumeration.
#[derive(Debug, Clone)]
pub struct CorpusFile {
    pub abs_path: PathBuf,
    /// Path relative to the corpus root, `/`-separated.
    pub rel_path: String,
    pub kind: FileKind,
    pub size_bytes: u64,
    /// Modification time as unix seconds, for display; 0 when unavailable.
    pub modified_secs: i64,
    /// Full-precision modification time in unix nanoseconds. Change
    /// detection hashes this, not the truncated seconds, so a rewrite
    /// landing within the same second still invalidates the cache.
    pub modified_nanos: u128,
}

/// A document with extracted text, ready for indexing.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub rel_path: String,
    pub kind: FileKind,
    pub size_bytes: u64,
    pub modified_secs: i64,
    pub text: String,
}

/// A file that could not be indexed, with the reason it was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Documents loaded from a corpus root plus per-file failures.
#[derive(Debug, Default)]
pub struct CorpusLoad {
    pub documents: Vec<RawDocument>,
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus root not found: {0}")]
    RootNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Enumerates every indexable file under `root`, sorted by relative
/// path so document ordinals are stable across runs.
pub fn scan_corpus(root: &Path) -> Result<Vec<CorpusFile>, CorpusError> {
    if !root.is_dir() {
        return Err(CorpusError::RootNotFound(root.display().to_string()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("skipping unreadable directory entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(kind) = FileKind::from_path(entry.path()) else {
            continue;
        };
        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                warn!(path = %entry.path().display(), "skipping file without metadata: {e}");
                continue;
            }
        };
        let rel_path = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .unwrap_or_default();
        files.push(CorpusFile {
            abs_path: entry.into_path(),
            rel_path,
            kind,
            size_bytes: meta.len(),
            modified_secs: modified.as_secs() as i64,
            modified_nanos: modified.as_nanos(),
        });
    }

    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(files)
}

/// Reads text for every scanned file. Unreadable, empty or
/// extractor-less files are recorded as skipped, never fatal.
pub fn read_documents(files: Vec<CorpusFile>) -> CorpusLoad {
    let mut load = CorpusLoad::default();
    for file in files {
        match read_document(&file) {
            Ok(doc) => load.documents.push(doc),
            Err(reason) => {
                warn!(path = %file.rel_path, %reason, "skipping file");
                load.skipped.push(SkippedFile {
                    path: file.rel_path,
                    reason,
                });
            }
        }
    }
    load
}

/// Scans and reads a corpus root in one pass.
pub fn load_corpus(root: &Path) -> Result<CorpusLoad, CorpusError> {
    Ok(read_documents(scan_corpus(root)?))
}

fn read_document(file: &CorpusFile) -> Result<RawDocument, String> {
    let text = match file.kind {
        FileKind::Text | FileKind::Markdown => {
            fs::read_to_string(&file.abs_path).map_err(|e| format!("unreadable: {e}"))?
        }
        FileKind::Pdf => return Err("no text extractor available for PDF".to_string()),
    };
    if text.trim().is_empty() {
        return Err("file contains no text".to_string());
    }
    Ok(RawDocument {
        rel_path: file.rel_path.clone(),
        kind: file.kind,
        size_bytes: file.size_bytes,
        modified_secs: file.modified_secs,
        text,
    })
}
