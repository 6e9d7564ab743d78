//! Retrieval engine: index lifecycle, query dispatch, and persistence.
//!
//! The engine owns one [`Index`] generation behind a read-write lock.
//! Queries clone the current `Arc` and read without blocking; rebuilds
//! run under a separate build lock and swap a fully built generation in
//! atomically, so a half-built index is never visible. Snapshots are
//! written documents first and manifest last, which means a manifest is
//! only ever observed alongside the data it describes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{TimeZone, Utc};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::config::EngineConfig;
use crate::corpus::{self, CorpusLoad, FileKind, RawDocument, SkippedFile};
use crate::embedding::Embedder;
use crate::storage::{StorageBackend, StorageError};
use crate::text::{Normalizer, QueryExpander};

use super::fusion::{self, FusedScore};
use super::index::Index;
use super::semantic::SemanticModel;
use super::snippet;
use super::types::{
    DocId, Document, IndexManifest, IndexOrigin, PersistedDocuments, ScoredHit, SearchError,
    SearchMethod, StoredDocument,
};

const MANIFEST_KEY: &str = "index/manifest.json";
const DOCUMENTS_KEY: &str = "index/documents.json";
const EMBEDDINGS_KEY: &str = "index/embeddings.bin";

/// Multi-signal retrieval over one corpus directory.
pub struct RetrievalEngine<S: StorageBackend> {
    storage: S,
    corpus_root: PathBuf,
    config: EngineConfig,
    normalizer: Normalizer,
    expander: QueryExpander,
    embedder: Option<Arc<dyn Embedder>>,
    /// Set once the embedding provider fails; never cleared. Semantic
    /// scoring delegates to the lexical model from then on.
    semantic_degraded: AtomicBool,
    index: RwLock<Arc<Index>>,
    build_lock: Mutex<()>,
    origin: IndexOrigin,
}

impl<S: StorageBackend> RetrievalEngine<S> {
    /// Opens the engine over a corpus directory.
    ///
    /// When the stored snapshot's fingerprint matches the directory
    /// listing, the index is restored without re-reading document
    /// bodies from the corpus. Otherwise the corpus is read, indexed,
    /// and persisted; a persistence failure is logged but does not fail
    /// the build.
    #[instrument(skip_all)]
    pub async fn load_or_build(
        storage: S,
        corpus_root: impl Into<PathBuf>,
        config: EngineConfig,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> Result<Self, SearchError> {
        let corpus_root = corpus_root.into();
        let listing = corpus::scan_corpus(&corpus_root)?;
        let fingerprint = corpus::compute_fingerprint(&listing);

        let normalizer = Normalizer::new(config.normalize_mode);
        let expander = QueryExpander::new(config.query_expansion);

        let restored = Self::restore_snapshot(
            &storage,
            &fingerprint,
            &config,
            &normalizer,
            embedder.as_deref(),
        )
        .await;

        let (index, origin) = match restored {
            Some(index) => {
                info!(documents = index.len(), "restored index snapshot");
                (index, IndexOrigin::Restored)
            }
            None => {
                let load = corpus::read_documents(listing);
                let index =
                    Self::fit_index(load, fingerprint, &config, &normalizer, embedder.as_deref())
                        .await;
                if let Err(e) = Self::persist_snapshot(&storage, &index).await {
                    warn!(error = %e, "failed to persist index snapshot");
                }
                info!(documents = index.len(), "built index from corpus");
                (index, IndexOrigin::Rebuilt)
            }
        };

        let degraded = embedder.is_some() && !index.is_empty() && index.semantic.is_none();
        Ok(Self {
            storage,
            corpus_root,
            config,
            normalizer,
            expander,
            embedder,
            semantic_degraded: AtomicBool::new(degraded),
            index: RwLock::new(Arc::new(index)),
            build_lock: Mutex::new(()),
            origin,
        })
    }

    /// Runs one query and returns ranked hits with snippets and
    /// display metadata.
    ///
    /// `scope` limits results to documents whose path equals an entry
    /// or sits below it; an empty scope matches everything.
    #[instrument(skip_all)]
    pub async fn search(
        &self,
        query: &str,
        method: SearchMethod,
        k: usize,
        scope: &[String],
    ) -> Result<Vec<ScoredHit>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery("query is empty".to_string()));
        }
        if k == 0 {
            return Err(SearchError::InvalidQuery(
                "result count must be positive".to_string(),
            ));
        }
        let index = self.current_index();
        if index.is_empty() {
            return Err(SearchError::EmptyIndex);
        }

        let mask = index.scope_mask(scope);
        let tokens = self.query_tokens(query);

        let hits = match method {
            SearchMethod::Lexical => {
                let ranked = index.lexical.search(&tokens, k, mask.as_deref());
                self.plain_hits(&index, ranked, SearchMethod::Lexical, query)
            }
            SearchMethod::Probabilistic => {
                let ranked = index.probabilistic.search(&tokens, k, mask.as_deref());
                self.plain_hits(&index, ranked, SearchMethod::Probabilistic, query)
            }
            SearchMethod::Semantic => {
                let (ranked, tag) = self
                    .semantic_ranked(&index, query, &tokens, k, mask.as_deref())
                    .await;
                self.plain_hits(&index, ranked, tag, query)
            }
            SearchMethod::Fused => {
                self.fused_hits(&index, &tokens, query, k, mask.as_deref())
                    .await
            }
        };
        Ok(hits)
    }

    /// Rescans the corpus and rebuilds when its fingerprint changed, or
    /// unconditionally when `force` is set. Returns the document count
    /// of the generation in effect afterwards.
    #[instrument(skip_all)]
    pub async fn reload(&self, force: bool) -> Result<usize, SearchError> {
        let _guard = self.build_lock.lock().await;

        let listing = corpus::scan_corpus(&self.corpus_root)?;
        let fingerprint = corpus::compute_fingerprint(&listing);
        if !force && fingerprint == self.current_index().fingerprint {
            info!("corpus unchanged, keeping current index");
            return Ok(self.current_index().len());
        }

        let load = corpus::read_documents(listing);
        let index = Self::fit_index(
            load,
            fingerprint,
            &self.config,
            &self.normalizer,
            self.active_embedder(),
        )
        .await;
        self.note_semantic_failure(&index);
        if let Err(e) = Self::persist_snapshot(&self.storage, &index).await {
            warn!(error = %e, "failed to persist index snapshot");
        }
        let count = index.len();
        self.swap(index);
        info!(documents = count, force, "index rebuilt");
        Ok(count)
    }

    /// Adds one document under a corpus-relative path and rebuilds.
    ///
    /// Existing documents are re-fitted together with the new one, so
    /// vocabulary and corpus statistics stay exact. Embeddings for the
    /// unchanged documents are reused; only the new text is encoded.
    /// Returns the new document count.
    #[instrument(skip_all)]
    pub async fn ingest(&self, path: &str, text: &str) -> Result<usize, SearchError> {
        if text.trim().is_empty() {
            return Err(SearchError::Ingestion(
                "document contains no text".to_string(),
            ));
        }

        let _guard = self.build_lock.lock().await;
        let current = self.current_index();
        if current.documents.iter().any(|doc| doc.path == path) {
            return Err(SearchError::Ingestion(format!(
                "document already indexed: {}",
                path
            )));
        }

        let mut raw: Vec<RawDocument> =
            current.documents.iter().map(RawDocument::from).collect();
        raw.push(RawDocument {
            rel_path: path.to_string(),
            kind: FileKind::from_path(Path::new(path)).unwrap_or(FileKind::Text),
            size_bytes: text.len() as u64,
            modified_secs: Utc::now().timestamp(),
            text: text.to_string(),
        });

        // The caller may have placed the file under the corpus root
        // already; a fresh scan picks that up so the snapshot stays
        // valid for the next startup.
        let fingerprint = match corpus::scan_corpus(&self.corpus_root) {
            Ok(listing) => corpus::compute_fingerprint(&listing),
            Err(e) => {
                warn!(error = %e, "corpus rescan failed, keeping current fingerprint");
                current.fingerprint.clone()
            }
        };

        let mut index = Index::build(
            raw,
            current.skipped.clone(),
            fingerprint,
            &self.config,
            &self.normalizer,
        );
        index.semantic = match (self.active_embedder(), current.semantic.as_ref()) {
            (Some(embedder), Some(semantic)) if semantic.dim() == embedder.dim() => {
                match embedder.encode(text).await {
                    Ok(vector) if vector.len() == embedder.dim() => {
                        let mut rows = semantic.rows().to_vec();
                        rows.push(vector);
                        Some(SemanticModel::new(rows))
                    }
                    Ok(_) => {
                        warn!("embedding provider returned a vector of the wrong width");
                        None
                    }
                    Err(e) => {
                        warn!(error = %e, "embedding provider failed during ingest");
                        None
                    }
                }
            }
            (Some(embedder), _) => embed_documents(embedder, &index.documents).await,
            (None, _) => None,
        };
        self.note_semantic_failure(&index);

        if let Err(e) = Self::persist_snapshot(&self.storage, &index).await {
            warn!(error = %e, "failed to persist index snapshot");
        }
        let count = index.len();
        self.swap(index);
        info!(documents = count, path, "document ingested");
        Ok(count)
    }

    pub fn document_count(&self) -> usize {
        self.current_index().len()
    }

    pub fn fingerprint(&self) -> String {
        self.current_index().fingerprint.clone()
    }

    /// Whether the startup index came from a snapshot or a full build.
    pub fn origin(&self) -> IndexOrigin {
        self.origin
    }

    pub fn is_semantic_degraded(&self) -> bool {
        self.semantic_degraded.load(Ordering::Relaxed)
    }

    /// Files the most recent build could not ingest.
    pub fn skipped_files(&self) -> Vec<SkippedFile> {
        self.current_index().skipped.clone()
    }

    /// Expands the query with synonyms, then normalizes the expanded
    /// token stream the same way document text was normalized.
    fn query_tokens(&self, query: &str) -> Vec<String> {
        let expanded = self.expander.expand(query).join(" ");
        self.normalizer.normalize(&expanded)
    }

    /// Semantic ranking, or the lexical ranking when the provider is
    /// unavailable. The returned tag names the model that actually ran.
    async fn semantic_ranked(
        &self,
        index: &Index,
        query: &str,
        tokens: &[String],
        k: usize,
        mask: Option<&[bool]>,
    ) -> (Vec<(DocId, f32)>, SearchMethod) {
        if !self.semantic_degraded.load(Ordering::Relaxed) {
            if let (Some(embedder), Some(semantic)) =
                (self.embedder.as_deref(), index.semantic.as_ref())
            {
                match embedder.encode(query).await {
                    Ok(vector) if vector.len() == semantic.dim() => {
                        return (semantic.search(&vector, k, mask), SearchMethod::Semantic);
                    }
                    Ok(_) => {
                        warn!("query embedding width differs from the index, disabling semantic search");
                        self.semantic_degraded.store(true, Ordering::Relaxed);
                    }
                    Err(e) => {
                        warn!(error = %e, "embedding provider failed, disabling semantic search");
                        self.semantic_degraded.store(true, Ordering::Relaxed);
                    }
                }
            }
        }
        (index.lexical.search(tokens, k, mask), SearchMethod::Lexical)
    }

    /// Fused ranking over all three models at `2k` candidate depth.
    ///
    /// A degraded semantic model contributes its delegated lexical
    /// ranking under the semantic weight; fusion does not branch on
    /// provider availability.
    async fn fused_hits(
        &self,
        index: &Index,
        tokens: &[String],
        query: &str,
        k: usize,
        mask: Option<&[bool]>,
    ) -> Vec<ScoredHit> {
        let depth = k.saturating_mul(2);
        let lexical = index.lexical.search(tokens, depth, mask);
        let probabilistic = index.probabilistic.search(tokens, depth, mask);
        let (semantic, _) = self
            .semantic_ranked(index, query, tokens, depth, mask)
            .await;

        let fused = fusion::fuse(
            &lexical,
            &probabilistic,
            &semantic,
            &self.config.fusion_weights,
            k,
        );
        fused
            .into_iter()
            .map(|(id, score)| {
                self.make_hit(
                    &index.documents[id.as_usize()],
                    score.fused,
                    SearchMethod::Fused,
                    Some(&score),
                    query,
                )
            })
            .collect()
    }

    fn plain_hits(
        &self,
        index: &Index,
        ranked: Vec<(DocId, f32)>,
        method: SearchMethod,
        query: &str,
    ) -> Vec<ScoredHit> {
        ranked
            .into_iter()
            .map(|(id, score)| {
                self.make_hit(&index.documents[id.as_usize()], score, method, None, query)
            })
            .collect()
    }

    fn make_hit(
        &self,
        doc: &Document,
        score: f32,
        method: SearchMethod,
        components: Option<&FusedScore>,
        query: &str,
    ) -> ScoredHit {
        let snippet = snippet::extract(&doc.text, query, self.config.context_window);
        let (file_name, folder) = split_path(&doc.path);
        ScoredHit {
            doc_id: doc.id,
            path: doc.path.clone(),
            file_name,
            folder,
            file_type: doc.kind.label().to_string(),
            score,
            method,
            lexical_score: components.and_then(|c| c.lexical),
            probabilistic_score: components.and_then(|c| c.probabilistic),
            semantic_score: components.and_then(|c| c.semantic),
            summary: snippet.summary,
            key_points: snippet.points,
            file_size: format_size(doc.size_bytes),
            modified_date: format_modified(doc.modified_secs),
        }
    }

    async fn restore_snapshot(
        storage: &S,
        fingerprint: &str,
        config: &EngineConfig,
        normalizer: &Normalizer,
        embedder: Option<&dyn Embedder>,
    ) -> Option<Index> {
        let manifest_bytes = match storage.load(MANIFEST_KEY).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => return None,
            Err(e) => {
                warn!(error = %e, "failed to read index manifest");
                return None;
            }
        };
        let manifest: IndexManifest = match serde_json::from_slice(&manifest_bytes) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(error = %e, "stored index manifest is corrupt");
                return None;
            }
        };
        if !manifest.is_compatible() {
            info!(
                schema = manifest.schema_version,
                "stored index schema is unsupported, rebuilding"
            );
            return None;
        }
        if manifest.fingerprint != fingerprint {
            info!("corpus changed since last index build, rebuilding");
            return None;
        }

        let doc_bytes = match storage.load(DOCUMENTS_KEY).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to read stored documents");
                return None;
            }
        };
        let stored: PersistedDocuments = match serde_json::from_slice(&doc_bytes) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "stored documents are corrupt");
                return None;
            }
        };
        if stored.documents.len() != manifest.document_count {
            warn!(
                expected = manifest.document_count,
                found = stored.documents.len(),
                "stored document count disagrees with manifest"
            );
            return None;
        }

        let raw: Vec<RawDocument> = stored.documents.into_iter().map(RawDocument::from).collect();
        let mut index = Index::build(raw, Vec::new(), manifest.fingerprint, config, normalizer);

        match storage.load(EMBEDDINGS_KEY).await {
            Ok(bytes) => match deserialize_embeddings(&bytes) {
                Some(rows) if rows.len() == index.len() => {
                    index.semantic = Some(SemanticModel::new(rows));
                }
                Some(_) => warn!("stored embeddings do not cover every document"),
                None => warn!("stored embeddings are corrupt"),
            },
            Err(StorageError::NotFound(_)) => {}
            Err(e) => warn!(error = %e, "failed to read stored embeddings"),
        }

        if let (Some(embedder), Some(semantic)) = (embedder, index.semantic.as_ref()) {
            if semantic.dim() != embedder.dim() {
                info!("stored embedding width differs from the active provider, re-encoding");
                index.semantic = None;
            }
        }
        if let Some(embedder) = embedder {
            if index.semantic.is_none() && !index.is_empty() {
                index.semantic = embed_documents(embedder, &index.documents).await;
            }
        }

        Some(index)
    }

    async fn fit_index(
        load: CorpusLoad,
        fingerprint: String,
        config: &EngineConfig,
        normalizer: &Normalizer,
        embedder: Option<&dyn Embedder>,
    ) -> Index {
        let CorpusLoad { documents, skipped } = load;
        let mut index = Index::build(documents, skipped, fingerprint, config, normalizer);
        if let Some(embedder) = embedder {
            if !index.is_empty() {
                index.semantic = embed_documents(embedder, &index.documents).await;
            }
        }
        index
    }

    async fn persist_snapshot(storage: &S, index: &Index) -> Result<(), StorageError> {
        let stored: Vec<StoredDocument> =
            index.documents.iter().map(StoredDocument::from).collect();
        let payload = PersistedDocuments { documents: stored };
        let bytes = serde_json::to_vec(&payload).map_err(|e| {
            StorageError::SerializationError(format!("Failed to serialize documents: {}", e))
        })?;
        storage.save(DOCUMENTS_KEY, &bytes).await?;

        match index.semantic.as_ref() {
            Some(semantic) => {
                storage
                    .save(EMBEDDINGS_KEY, &serialize_embeddings(semantic))
                    .await?;
            }
            // A stale embedding blob must not outlive the documents it
            // was encoded from.
            None => match storage.delete(EMBEDDINGS_KEY).await {
                Ok(()) | Err(StorageError::NotFound(_)) => {}
                Err(e) => return Err(e),
            },
        }

        let manifest = IndexManifest::new(index.len(), index.fingerprint.clone());
        let manifest_bytes = serde_json::to_vec_pretty(&manifest).map_err(|e| {
            StorageError::SerializationError(format!("Failed to serialize manifest: {}", e))
        })?;
        storage.save(MANIFEST_KEY, &manifest_bytes).await
    }

    fn active_embedder(&self) -> Option<&dyn Embedder> {
        if self.semantic_degraded.load(Ordering::Relaxed) {
            None
        } else {
            self.embedder.as_deref()
        }
    }

    /// Marks the engine degraded when an embedder is configured but the
    /// freshly built index ended up without a semantic model.
    fn note_semantic_failure(&self, index: &Index) {
        if self.embedder.is_some() && !index.is_empty() && index.semantic.is_none() {
            self.semantic_degraded.store(true, Ordering::Relaxed);
        }
    }

    fn current_index(&self) -> Arc<Index> {
        Arc::clone(&self.index.read().expect("index lock poisoned"))
    }

    fn swap(&self, index: Index) {
        *self.index.write().expect("index lock poisoned") = Arc::new(index);
    }
}

/// Encodes every document body, returning `None` when the provider
/// fails so the caller can continue without semantic scoring.
async fn embed_documents(
    embedder: &dyn Embedder,
    documents: &[Document],
) -> Option<SemanticModel> {
    let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
    match embedder.encode_batch(&texts).await {
        Ok(rows) if rows.len() == documents.len() => Some(SemanticModel::new(rows)),
        Ok(_) => {
            warn!("embedding provider returned the wrong number of rows");
            None
        }
        Err(e) => {
            warn!(error = %e, "embedding provider failed, continuing without semantic scoring");
            None
        }
    }
}

fn serialize_embeddings(model: &SemanticModel) -> Vec<u8> {
    let dim = model.dim() as u32;
    let count = model.len() as u32;
    let mut bytes = Vec::with_capacity(8 + (dim as usize) * (count as usize) * 4);
    bytes.extend_from_slice(&dim.to_le_bytes());
    bytes.extend_from_slice(&count.to_le_bytes());
    for row in model.rows() {
        // a ragged row would write a blob whose payload contradicts the header
        debug_assert_eq!(row.len(), dim as usize, "embedding rows must share one width");
        for value in row {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    bytes
}

fn deserialize_embeddings(bytes: &[u8]) -> Option<Vec<Vec<f32>>> {
    if bytes.len() < 8 {
        return None;
    }
    let dim = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let count = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    if dim == 0 {
        return None;
    }
    let payload = &bytes[8..];
    if payload.len() != dim.checked_mul(count)?.checked_mul(4)? {
        return None;
    }
    let mut rows = Vec::with_capacity(count);
    for row_bytes in payload.chunks_exact(dim * 4) {
        let mut row = Vec::with_capacity(dim);
        for chunk in row_bytes.chunks_exact(4) {
            row.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        rows.push(row);
    }
    Some(rows)
}

fn split_path(path: &str) -> (String, String) {
    match path.rsplit_once(['/', '\\']) {
        Some((folder, name)) => (name.to_string(), folder.to_string()),
        None => (path.to_string(), "Root".to_string()),
    }
}

fn format_size(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

fn format_modified(secs: i64) -> String {
    match Utc.timestamp_opt(secs, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}
