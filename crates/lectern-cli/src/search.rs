//! Engine wiring for the CLI commands.
//!
//! Opens the on-disk index database, loads or builds the retrieval
//! engine over the corpus root, and implements file ingestion into the
//! corpus uploads folder.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use lectern_core::config::EngineConfig;
use lectern_core::embedding::HashEmbedder;
use lectern_core::search::RetrievalEngine;
use lectern_core::storage::RedbStorage;
use tracing::info;

use crate::config;

/// Opens storage and loads the engine, restoring a cached index when
/// the corpus fingerprint still matches.
pub async fn open_engine(
    corpus_root: &Path,
    data_dir: Option<&PathBuf>,
    expand_queries: bool,
) -> Result<RetrievalEngine<RedbStorage>> {
    let db_path = config::database_path(data_dir)?;
    info!("Opening database: {}", db_path.display());
    let storage = RedbStorage::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    let engine_config = EngineConfig {
        query_expansion: expand_queries,
        ..EngineConfig::default()
    };
    let engine = RetrievalEngine::load_or_build(
        storage,
        corpus_root,
        engine_config,
        Some(Arc::new(HashEmbedder::default())),
    )
    .await
    .context("Failed to load search engine")?;

    info!("Loaded index with {} documents", engine.document_count());
    Ok(engine)
}

/// Copies a file into the corpus uploads folder and indexes it.
///
/// Copying keeps the on-disk corpus in sync with the index snapshot,
/// so later rebuilds find the document again. A name collision gets a
/// numeric suffix rather than overwriting the existing file. Returns
/// the corpus-relative path the document was indexed under.
pub async fn ingest_file(
    engine: &RetrievalEngine<RedbStorage>,
    corpus_root: &Path,
    source: &Path,
) -> Result<String> {
    let text = std::fs::read_to_string(source)
        .with_context(|| format!("Failed to read file: {}", source.display()))?;

    let uploads = corpus_root.join("uploads");
    std::fs::create_dir_all(&uploads)
        .with_context(|| format!("Failed to create uploads folder: {}", uploads.display()))?;

    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .context("Source path has no usable file name")?;
    let target = unique_target(&uploads, file_name);
    std::fs::copy(source, &target)
        .with_context(|| format!("Failed to copy into corpus: {}", target.display()))?;

    let rel = format!(
        "uploads/{}",
        target
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file_name)
    );
    engine.ingest(&rel, &text).await?;
    Ok(rel)
}

/// First free name among `name`, `stem_1.ext`, `stem_2.ext`, ...
fn unique_target(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (file_name, None),
    };
    let mut counter = 1;
    loop {
        let next = match ext {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        let candidate = dir.join(next);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
