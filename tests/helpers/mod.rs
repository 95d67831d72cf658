#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use recollect::db;
use recollect::embedding::cache::EmbeddingCache;
use recollect::embedding::{EmbeddingProvider, TaskType};
use recollect::index::snapshot::SnapshotPaths;
use recollect::index::VectorIndex;
use recollect::memory::records::RecordStore;
use recollect::memory::store::MemoryStore;

pub const DIM: usize = 4;

/// Deterministic `dim`-wide embedding with a spike at position `seed`.
pub fn test_embedding(seed: usize, dim: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dim];
    v[seed % dim] = 1.0;
    v
}

/// Embedding provider for tests: fixed vectors for known texts, a byte-sum
/// vector for everything else. Can be switched into a failing mode.
pub struct FakeEmbedder {
    table: HashMap<String, Vec<f32>>,
    dims: usize,
    failing: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            table: HashMap::new(),
            dims,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn fallback(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for (i, b) in text.bytes().enumerate() {
            v[i % self.dims] += b as f32;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str, _task: TaskType) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("embedding service unavailable");
        }
        Ok(self
            .table
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.fallback(text)))
    }

    fn model_name(&self) -> &str {
        "fake-embedder"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// The three-memory fixture: `a` and `c` point almost the same way, `b` is
/// orthogonal to both.
pub fn scenario_embedder() -> FakeEmbedder {
    FakeEmbedder::new(DIM)
        .with("a", vec![1.0, 0.0, 0.0, 0.0])
        .with("b", vec![0.0, 1.0, 0.0, 0.0])
        .with("c", vec![0.9, 0.1, 0.0, 0.0])
}

/// An in-memory store without snapshots.
pub fn memory_store(embedder: Arc<FakeEmbedder>) -> MemoryStore {
    let dim = embedder.dimensions();
    let records = Arc::new(RecordStore::new(db::open_memory_database().unwrap(), dim).unwrap());
    MemoryStore::new(
        records,
        Arc::new(VectorIndex::new(dim)),
        embedder,
        EmbeddingCache::new(256),
    )
    .unwrap()
}

/// Open an on-disk record store at `dir/memory.db`.
pub fn open_records(dir: &Path, dim: usize) -> Arc<RecordStore> {
    open_records_at(&dir.join("memory.db"), dim)
}

pub fn open_records_at(db_path: &Path, dim: usize) -> Arc<RecordStore> {
    let conn = db::open_database(db_path).unwrap();
    Arc::new(RecordStore::new(conn, dim).unwrap())
}

/// Snapshot files for `dir/memory.db`.
pub fn snapshot_paths(dir: &Path) -> SnapshotPaths {
    SnapshotPaths::for_database(dir, &dir.join("memory.db"))
}

/// An on-disk store at `dir/memory.db` that loads (or rebuilds) its index and
/// snapshots after every save, the way a restarted process would.
pub fn disk_store(dir: &Path, embedder: Arc<FakeEmbedder>) -> MemoryStore {
    disk_store_at(&dir.join("memory.db"), embedder)
}

/// Like [`disk_store`], for a database file with any name. Snapshots go next
/// to the database.
pub fn disk_store_at(db_path: &Path, embedder: Arc<FakeEmbedder>) -> MemoryStore {
    let dim = embedder.dimensions();
    let records = open_records_at(db_path, dim);
    let dir = db_path.parent().unwrap();
    let paths = SnapshotPaths::for_database(dir, db_path);
    let index = Arc::new(VectorIndex::load_or_rebuild(dim, &paths, &records).unwrap());
    MemoryStore::new(records, index, embedder, EmbeddingCache::new(256))
        .unwrap()
        .with_snapshots(paths, true)
}
