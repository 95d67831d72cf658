//! Memory store — the save/query contract consumed by agents.
//!
//! Save path: validate → embed (cache first) → append record → add to index →
//! best-effort snapshot. Query path: validate → embed (cache first) → index
//! search → hydrate hits from the record store.
//!
//! The record write and the index update are not one transaction. If the
//! process dies in between, the next [`VectorIndex::load_or_rebuild`] sees a
//! stale snapshot and replays the record store. Within a process, a write
//! lock keeps index order identical to record order, so a rebuild reproduces
//! the live index exactly.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;

use crate::config::RecollectConfig;
use crate::db;
use crate::embedding::cache::EmbeddingCache;
use crate::embedding::{EmbeddingProvider, TaskType};
use crate::error::{MemoryError, Result};
use crate::index::snapshot::SnapshotPaths;
use crate::index::VectorIndex;
use crate::memory::records::RecordStore;
use crate::memory::types::{QueryOutcome, SaveAck, ScoredMemory, StoreStats};

pub struct MemoryStore {
    records: Arc<RecordStore>,
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
    snapshot: Option<SnapshotPaths>,
    snapshot_on_save: bool,
    /// Held across record append + index add, and across rebuilds.
    write_lock: Arc<Mutex<()>>,
}

fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(MemoryError::InvalidInput(
            "text must not be empty or whitespace".into(),
        ));
    }
    Ok(())
}

fn validate_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(MemoryError::InvalidInput("k must be at least 1".into()));
    }
    Ok(())
}

impl MemoryStore {
    /// Assemble a store from its parts. All three components must agree on
    /// the embedding dimension.
    pub fn new(
        records: Arc<RecordStore>,
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        cache: EmbeddingCache,
    ) -> Result<Self> {
        let dim = records.dimensions();
        MemoryError::check_dimension(dim, index.dimensions())?;
        MemoryError::check_dimension(dim, embedder.dimensions())?;
        Ok(Self {
            records,
            index,
            embedder,
            cache,
            snapshot: None,
            snapshot_on_save: false,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Enable index snapshots at `paths`, optionally after every save.
    pub fn with_snapshots(mut self, paths: SnapshotPaths, on_save: bool) -> Self {
        self.snapshot = Some(paths);
        self.snapshot_on_save = on_save;
        self
    }

    /// Open the on-disk store described by `config`: database, index
    /// (snapshot or rebuild), and a bounded embedding cache.
    pub fn open(config: &RecollectConfig, embedder: Arc<dyn EmbeddingProvider>) -> anyhow::Result<Self> {
        let dim = config.embedding.dimensions;
        let db_path = config.resolved_db_path();
        let conn = db::open_database(&db_path)?;

        match db::meta::get_embedding_model(&conn)? {
            Some(stored) if stored != embedder.model_name() => {
                tracing::warn!(
                    stored = %stored,
                    configured = %embedder.model_name(),
                    "embedding model changed; stored vectors came from a different model"
                );
            }
            Some(_) => {}
            None => db::meta::set_embedding_model(&conn, embedder.model_name())?,
        }

        let records = Arc::new(
            RecordStore::new(conn, dim)
                .with_context(|| format!("cannot open store at {}", db_path.display()))?,
        );

        let paths = config.resolved_snapshot_paths();
        let index = Arc::new(VectorIndex::load_or_rebuild(dim, &paths, &records)?);
        let cache = EmbeddingCache::from_config(&config.cache);

        tracing::info!(
            db = %db_path.display(),
            vectors = index.len(),
            dims = dim,
            "memory store ready"
        );

        Ok(Self::new(records, index, embedder, cache)?
            .with_snapshots(paths, config.storage.snapshot_on_save))
    }

    pub fn dimensions(&self) -> usize {
        self.records.dimensions()
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Embed through the cache, rejecting vectors of the wrong width.
    async fn embed(&self, text: &str, task: TaskType) -> Result<Arc<Vec<f32>>> {
        if let Some(hit) = self.cache.get(task, text) {
            tracing::debug!(task = %task, "embedding cache hit");
            return Ok(hit);
        }

        let vector = self
            .embedder
            .embed(text, task)
            .await
            .map_err(|e| MemoryError::EmbeddingService(format!("{e:#}")))?;
        MemoryError::check_dimension(self.dimensions(), vector.len())?;
        if MemoryError::check_finite(&vector).is_err() {
            return Err(MemoryError::EmbeddingService(
                "embedding service returned non-finite values".into(),
            ));
        }

        let vector = Arc::new(vector);
        self.cache.insert(task, text, Arc::clone(&vector));
        Ok(vector)
    }

    /// Embed and store `text`.
    pub async fn save(&self, text: &str) -> Result<SaveAck> {
        self.save_in_session(text, None).await
    }

    /// Embed and store `text` tagged with an optional session id.
    pub async fn save_in_session(&self, text: &str, session_id: Option<&str>) -> Result<SaveAck> {
        validate_text(text)?;
        let embedding = self.embed(text, TaskType::Document).await?;
        self.persist(text, embedding, session_id).await
    }

    /// Store `text` with a precomputed embedding.
    pub async fn save_embedding(
        &self,
        text: &str,
        embedding: Vec<f32>,
        session_id: Option<&str>,
    ) -> Result<SaveAck> {
        validate_text(text)?;
        MemoryError::check_dimension(self.dimensions(), embedding.len())?;
        MemoryError::check_finite(&embedding)?;
        self.persist(text, Arc::new(embedding), session_id).await
    }

    async fn persist(
        &self,
        text: &str,
        embedding: Arc<Vec<f32>>,
        session_id: Option<&str>,
    ) -> Result<SaveAck> {
        let records = Arc::clone(&self.records);
        let index = Arc::clone(&self.index);
        let content = text.to_string();
        let session = session_id.map(str::to_string);
        let snapshot = self.snapshot.clone().filter(|_| self.snapshot_on_save);
        let write_lock = Arc::clone(&self.write_lock);

        let id = tokio::task::spawn_blocking(move || -> Result<String> {
            let id = {
                let _write = write_lock.lock().unwrap_or_else(PoisonError::into_inner);
                let id = records.append(&content, &embedding, session.as_deref())?;
                index.add(&embedding, id.clone())?;
                id
            };

            if let Some(paths) = snapshot {
                if let Err(e) = index.snapshot(&paths) {
                    tracing::warn!(error = %e, "failed to save index snapshot");
                }
            }
            Ok(id)
        })
        .await??;

        tracing::info!(id = %id, content_len = text.len(), "memory saved");
        Ok(SaveAck { id })
    }

    /// Top-`k` stored memories most similar to `text`.
    pub async fn query(&self, text: &str, k: usize) -> Result<QueryOutcome> {
        validate_text(text)?;
        validate_k(k)?;
        let embedding = self.embed(text, TaskType::Query).await?;
        self.search_hydrated(embedding, k).await
    }

    /// Top-`k` stored memories most similar to a precomputed query embedding.
    pub async fn search_embedding(&self, embedding: Vec<f32>, k: usize) -> Result<QueryOutcome> {
        validate_k(k)?;
        MemoryError::check_dimension(self.dimensions(), embedding.len())?;
        MemoryError::check_finite(&embedding)?;
        self.search_hydrated(Arc::new(embedding), k).await
    }

    async fn search_hydrated(&self, query: Arc<Vec<f32>>, k: usize) -> Result<QueryOutcome> {
        let records = Arc::clone(&self.records);
        let index = Arc::clone(&self.index);

        let outcome = tokio::task::spawn_blocking(move || -> Result<QueryOutcome> {
            let hits = match index.search(&query, k) {
                Ok(hits) => hits,
                Err(MemoryError::EmptyIndex) => return Ok(QueryOutcome::Empty),
                Err(e) => return Err(e),
            };

            let mut results = Vec::with_capacity(hits.len());
            for hit in hits {
                match records.get_by_id(&hit.id) {
                    Ok(record) => results.push(ScoredMemory {
                        similarity: hit.score,
                        content: record.content,
                        timestamp: record.created_at,
                        id: record.id,
                    }),
                    Err(MemoryError::NotFound(id)) => {
                        tracing::debug!(id = %id, "index entry has no record, skipping");
                    }
                    Err(MemoryError::CorruptRecord { id, reason }) => {
                        tracing::warn!(id = %id, reason = %reason, "skipping corrupt record");
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(QueryOutcome::Matches(results))
        })
        .await??;

        if let QueryOutcome::Matches(ref results) = outcome {
            tracing::info!(k, returned = results.len(), "memory query");
        }
        Ok(outcome)
    }

    /// Record, index and cache counts.
    pub async fn stats(&self) -> Result<StoreStats> {
        let records = Arc::clone(&self.records);
        let (count, (oldest, newest)) =
            tokio::task::spawn_blocking(move || -> Result<_> { Ok((records.count()?, records.time_range()?)) })
                .await??;

        Ok(StoreStats {
            records: count,
            indexed_vectors: self.index.len(),
            dimensions: self.dimensions(),
            cached_embeddings: self.cache.entry_count(),
            oldest_record: oldest,
            newest_record: newest,
        })
    }

    /// Rebuild the index from the record store and snapshot it.
    /// Returns the number of indexed vectors.
    ///
    /// The in-memory index is replaced even when writing the snapshot fails;
    /// the snapshot error is still returned.
    pub async fn reindex(&self) -> Result<usize> {
        let records = Arc::clone(&self.records);
        let index = Arc::clone(&self.index);
        let snapshot = self.snapshot.clone();
        let write_lock = Arc::clone(&self.write_lock);

        let count = tokio::task::spawn_blocking(move || -> Result<usize> {
            let count = {
                let _write = write_lock.lock().unwrap_or_else(PoisonError::into_inner);
                index.rebuild(&records)?
            };
            if let Some(paths) = snapshot {
                index.snapshot(&paths)?;
            }
            Ok(count)
        })
        .await??;

        tracing::info!(vectors = count, "index rebuilt");
        Ok(count)
    }
}
