//! Bounded in-process cache of computed embeddings.
//!
//! Keyed by `(task type, sha256(text))`. Uses `moka::sync::Cache`, so
//! concurrent readers and writers never corrupt it; two callers racing on the
//! same miss both compute, and the last insert wins.

use std::sync::Arc;

use moka::sync::Cache;
use sha2::{Digest, Sha256};

use super::TaskType;
use crate::config::CacheConfig;

type CacheKey = (TaskType, String);

#[derive(Clone)]
pub struct EmbeddingCache {
    inner: Cache<CacheKey, Arc<Vec<f32>>>,
}

fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

impl EmbeddingCache {
    /// A cache holding at most `max_entries` embeddings.
    pub fn new(max_entries: u64) -> Self {
        Self {
            inner: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.max_entries);
        if let Some(ttl) = config.ttl() {
            builder = builder.time_to_live(ttl);
        }
        Self {
            inner: builder.build(),
        }
    }

    pub fn get(&self, task: TaskType, text: &str) -> Option<Arc<Vec<f32>>> {
        self.inner.get(&(task, content_hash(text)))
    }

    pub fn insert(&self, task: TaskType, text: &str, embedding: Arc<Vec<f32>>) {
        self.inner.insert((task, content_hash(text)), embedding);
    }

    /// Approximate number of cached embeddings.
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}
