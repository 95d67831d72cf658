//! CLI `doctor` command — run database diagnostics and print a health report.

use anyhow::{Context, Result};

use crate::config::RecollectConfig;
use crate::db;
use crate::index::snapshot;

/// Run database and snapshot diagnostics and print a health report.
pub fn doctor(config: &RecollectConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `recollect serve` or `recollect save` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let conn = db::open_database(&db_path)
        .context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn)
        .context("failed to run health check")?;

    println!("recollect Health Report");
    println!("=======================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("Records:           {}", report.record_count);
    println!();
    println!("Embedding model:");
    println!("  Stored:          {}", report.embedding_model.as_deref().unwrap_or("(not set)"));
    println!("  Configured:      {}", config.embedding.model);
    match report.embedding_dim {
        Some(dim) if dim != config.embedding.dimensions => {
            println!(
                "  WARNING: store holds {dim}-dim vectors but config says {}.",
                config.embedding.dimensions
            );
        }
        Some(dim) => println!("  Dimensions:      {dim} (match)"),
        None => println!("  Dimensions:      (not set)"),
    }
    println!();

    let paths = config.resolved_snapshot_paths();
    let record_ids: Vec<String> = conn
        .prepare("SELECT id FROM memory_records ORDER BY seq ASC")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;
    match snapshot::read(&paths, config.embedding.dimensions) {
        Ok((_, ids)) if ids == record_ids => {
            println!("Index snapshot:    OK ({} vectors)", ids.len());
        }
        Ok((_, ids)) => {
            println!(
                "Index snapshot:    STALE ({} vectors, {} records), run `recollect reindex`",
                ids.len(),
                report.record_count
            );
        }
        Err(e) => println!("Index snapshot:    {e}; it will be rebuilt on next start"),
    }
    println!();

    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db {}", db_path.display());
        println!("  2. Then rebuild the index: recollect reindex");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
