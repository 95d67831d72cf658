pub mod doctor;
pub mod inspect;
pub mod query;
pub mod reindex;
pub mod save;
pub mod stats;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::RecollectConfig;
use crate::embedding::OfflineProvider;
use crate::memory::records::RecordStore;
use crate::memory::store::MemoryStore;

/// Open the record store without an embedding provider, for commands that
/// only read records.
pub fn open_records(config: &RecollectConfig) -> Result<RecordStore> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;
    RecordStore::new(conn, config.embedding.dimensions)
        .with_context(|| format!("cannot open store at {}", db_path.display()))
}

/// Open the full memory store for maintenance commands that never embed
/// text, so no API key is required.
pub fn open_offline_store(config: &RecollectConfig) -> Result<MemoryStore> {
    let embedder = Arc::new(OfflineProvider::from_config(&config.embedding));
    MemoryStore::open(config, embedder)
}
