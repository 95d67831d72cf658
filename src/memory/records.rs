//! Record store — durable, append-only storage of [`MemoryRecord`]s.
//!
//! The record table is the source of truth; the vector index is derived from
//! it and can always be rebuilt via [`RecordStore::list_embeddings`].

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{MemoryError, Result};
use crate::memory::types::MemoryRecord;
use crate::memory::{bytes_to_embedding, embedding_to_bytes};

/// SQLite-backed record store for a fixed embedding dimension.
pub struct RecordStore {
    conn: Mutex<Connection>,
    dim: usize,
}

impl RecordStore {
    /// Wrap an initialized connection (see [`crate::db::open_database`]).
    ///
    /// Pins `dim` in `schema_meta` on first use and fails with
    /// [`MemoryError::DimensionMismatch`] if the store was created with another width.
    pub fn new(conn: Connection, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(MemoryError::InvalidInput(
                "embedding dimension must be at least 1".into(),
            ));
        }
        crate::db::ensure_embedding_dim(&conn, dim)?;
        Ok(Self {
            conn: Mutex::new(conn),
            dim,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dim
    }

    // A poisoned lock only means another caller panicked mid-call; SQLite
    // rolled back any open transaction, so the connection is still usable.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate and persist a new record. Returns its id.
    pub fn append(&self, content: &str, embedding: &[f32], session_id: Option<&str>) -> Result<String> {
        MemoryError::check_dimension(self.dim, embedding.len())?;
        MemoryError::check_finite(embedding)?;

        let id = format!("mem_{}", uuid::Uuid::now_v7().simple());
        let created_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
        let bytes = embedding_to_bytes(embedding);

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO memory_records (id, session_id, created_at, content, embedding) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, session_id, created_at, content, bytes],
        )?;
        tx.commit()?;

        tracing::debug!(id = %id, content_len = content.len(), "record appended");
        Ok(id)
    }

    /// Fetch a single record by id.
    pub fn get_by_id(&self, id: &str) -> Result<MemoryRecord> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT id, session_id, created_at, content, embedding FROM memory_records WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Vec<u8>>(4)?,
                    ))
                },
            )
            .optional()?;

        let (id, session_id, created_at, content, bytes) =
            row.ok_or_else(|| MemoryError::NotFound(id.to_string()))?;

        let embedding = match self.decode(&bytes) {
            Some(v) => v,
            None => {
                tracing::warn!(id = %id, bytes = bytes.len(), "stored embedding does not decode");
                return Err(MemoryError::CorruptRecord {
                    id,
                    reason: format!(
                        "embedding blob is {} bytes, expected {} finite f32s",
                        bytes.len(),
                        self.dim
                    ),
                });
            }
        };

        Ok(MemoryRecord {
            id,
            session_id,
            created_at,
            content,
            embedding,
        })
    }

    /// Decode a blob into exactly `dim` finite components.
    fn decode(&self, bytes: &[u8]) -> Option<Vec<f32>> {
        bytes_to_embedding(bytes)
            .filter(|v| v.len() == self.dim && v.iter().all(|x| x.is_finite()))
    }

    /// All `(id, embedding)` pairs in insertion order, for index rebuild.
    ///
    /// Rows whose blob does not decode to exactly `dim` finite components are
    /// logged and skipped.
    pub fn list_embeddings(&self) -> Result<Vec<(String, Vec<f32>)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, embedding FROM memory_records ORDER BY seq ASC")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut out = Vec::with_capacity(rows.len());
        for (id, bytes) in rows {
            match self.decode(&bytes) {
                Some(v) => out.push((id, v)),
                None => tracing::warn!(
                    id = %id,
                    bytes = bytes.len(),
                    expected = self.dim * 4,
                    "skipping record with invalid embedding"
                ),
            }
        }
        Ok(out)
    }

    /// All record ids in insertion order.
    pub fn ids(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id FROM memory_records ORDER BY seq ASC")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM memory_records", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Oldest and newest creation timestamps, or `None` for an empty store.
    pub fn time_range(&self) -> Result<(Option<String>, Option<String>)> {
        let range = self.conn().query_row(
            "SELECT MIN(created_at), MAX(created_at) FROM memory_records",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(range)
    }
}
