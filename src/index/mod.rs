//! In-memory cosine-similarity index over fixed-dimension vectors.
//!
//! Vectors are L2-normalized on insert and on query, so the inner product of
//! a stored row and the query is their cosine similarity. Row `i` of the
//! vector buffer always belongs to `ids[i]`. A single mutex serializes adds
//! and searches.
//!
//! The index is a derived cache of the record store: [`VectorIndex::load_or_rebuild`]
//! trusts a snapshot only if it validates and lists exactly the stored record
//! ids in order, and otherwise replays every record.

pub mod snapshot;

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::error::{MemoryError, Result};
use crate::memory::records::RecordStore;
use snapshot::{SnapshotError, SnapshotPaths};

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexHit {
    pub id: String,
    pub score: f32,
}

#[derive(Debug, Default)]
struct IndexState {
    /// Row-major, `dim` floats per row, each row unit-norm (or all zeros).
    vectors: Vec<f32>,
    ids: Vec<String>,
}

impl IndexState {
    fn push(&mut self, normalized: Vec<f32>, id: String) {
        self.vectors.extend(normalized);
        self.ids.push(id);
    }
}

pub struct VectorIndex {
    dim: usize,
    state: Mutex<IndexState>,
    /// Orders snapshot writes so an older view never overwrites a newer one.
    snapshot_lock: Mutex<()>,
}

/// L2-normalize a vector. Zero vectors are returned unchanged.
///
/// The norm is accumulated in f64 so large finite components do not
/// overflow it.
pub fn normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector
        .iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt();
    if norm > 0.0 {
        vector.iter().map(|&x| (f64::from(x) / norm) as f32).collect()
    } else {
        vector.to_vec()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl VectorIndex {
    /// Create an empty index for `dim`-component vectors.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            state: Mutex::new(IndexState::default()),
            snapshot_lock: Mutex::new(()),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dim
    }

    // Every mutation pushes vector and id together, so state behind a
    // poisoned lock is still consistent.
    fn state(&self) -> MutexGuard<'_, IndexState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.state().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids in index order.
    pub fn ids(&self) -> Vec<String> {
        self.state().ids.clone()
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if self.dim == 0 {
            return Err(MemoryError::InvalidInput(
                "index dimension must be at least 1".into(),
            ));
        }
        MemoryError::check_dimension(self.dim, vector.len())?;
        MemoryError::check_finite(vector)
    }

    /// Normalize and append a vector under `id`.
    pub fn add(&self, vector: &[f32], id: impl Into<String>) -> Result<()> {
        self.check_vector(vector)?;
        let normalized = normalize(vector);
        self.state().push(normalized, id.into());
        Ok(())
    }

    /// Top-`k` rows by cosine similarity, best first. Equal scores keep
    /// insertion order. Returns every row when `k` exceeds the index size.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<IndexHit>> {
        self.check_vector(query)?;
        let query = normalize(query);

        let state = self.state();
        if state.ids.is_empty() {
            return Err(MemoryError::EmptyIndex);
        }

        let mut scored: Vec<(usize, f32)> = state
            .vectors
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(pos, row)| (pos, dot(row, &query)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(pos, score)| IndexHit {
                id: state.ids[pos].clone(),
                score,
            })
            .collect())
    }

    /// Replace the contents with a replay of `records` in insertion order.
    /// Returns the number of indexed vectors.
    pub fn rebuild(&self, records: &RecordStore) -> Result<usize> {
        let rows = records.list_embeddings()?;

        let mut fresh = IndexState::default();
        fresh.vectors.reserve(rows.len() * self.dim);
        for (id, vector) in rows {
            self.check_vector(&vector)?;
            fresh.push(normalize(&vector), id);
        }

        let count = fresh.ids.len();
        *self.state() = fresh;
        Ok(count)
    }

    /// Write the current vectors and ids to disk.
    ///
    /// The index lock is held only while encoding; file I/O happens outside it.
    pub fn snapshot(&self, paths: &SnapshotPaths) -> std::result::Result<(), SnapshotError> {
        let _ordered = self.snapshot_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let (bytes, ids) = {
            let state = self.state();
            (snapshot::encode_vectors(self.dim, &state.vectors), state.ids.clone())
        };

        snapshot::write(paths, &bytes, &ids)?;
        tracing::debug!(vectors = ids.len(), path = %paths.vectors.display(), "index snapshot written");
        Ok(())
    }

    /// Load a snapshot if it is valid and current, otherwise rebuild from
    /// `records` and write a fresh snapshot.
    ///
    /// Only record-store failures are errors; snapshot problems are logged.
    pub fn load_or_rebuild(dim: usize, paths: &SnapshotPaths, records: &RecordStore) -> Result<Self> {
        let index = Self::new(dim);

        match snapshot::read(paths, dim) {
            Ok((vectors, ids)) => {
                let expected = records.ids()?;
                if ids == expected {
                    tracing::info!(vectors = ids.len(), "loaded index snapshot");
                    *index.state() = IndexState { vectors, ids };
                    return Ok(index);
                }
                tracing::warn!(
                    snapshot = ids.len(),
                    records = expected.len(),
                    "index snapshot does not match the record store, rebuilding"
                );
            }
            Err(SnapshotError::Missing) => {
                tracing::info!("no index snapshot, building from record store");
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding index snapshot, rebuilding from record store");
            }
        }

        let count = index.rebuild(records)?;
        if let Err(e) = index.snapshot(paths) {
            tracing::warn!(error = %e, "failed to write index snapshot after rebuild");
        }
        tracing::info!(vectors = count, "index rebuilt from record store");
        Ok(index)
    }
}
