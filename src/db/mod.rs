//! SQLite database initialization, schema, store metadata, and health checks.

pub mod meta;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use crate::error::MemoryError;

/// Open (or create) the record database at the given path with the schema
/// initialized and its version checked.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    // WAL lets concurrent readers proceed while a writer commits
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    meta::check_schema_version(&conn)?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open an in-memory database with the schema initialized.
pub fn open_memory_database() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    meta::check_schema_version(&conn)?;
    Ok(conn)
}

/// Pin the store's embedding dimension on first use and reject later opens
/// configured with a different width.
pub fn ensure_embedding_dim(conn: &Connection, dim: usize) -> crate::error::Result<()> {
    match meta::get_embedding_dim(conn)? {
        Some(stored) => MemoryError::check_dimension(stored, dim),
        None => {
            meta::set_embedding_dim(conn, dim)?;
            Ok(())
        }
    }
}

/// Diagnostics reported by `recollect doctor`.
#[derive(Debug)]
pub struct HealthReport {
    pub schema_version: u32,
    pub integrity_ok: bool,
    pub integrity_details: String,
    pub record_count: u64,
    pub embedding_model: Option<String>,
    pub embedding_dim: Option<usize>,
}

/// Run `PRAGMA integrity_check` and collect row counts and stored metadata.
pub fn check_database_health(conn: &Connection) -> rusqlite::Result<HealthReport> {
    let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    let record_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM memory_records", [], |row| row.get(0))?;

    Ok(HealthReport {
        schema_version: meta::get_schema_version(conn)?,
        integrity_ok: integrity == "ok",
        integrity_details: integrity,
        record_count: record_count as u64,
        embedding_model: meta::get_embedding_model(conn)?,
        embedding_dim: meta::get_embedding_dim(conn)?,
    })
}
