//! CLI `reindex` command — rebuild the vector index from the record store.

use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::RecollectConfig;

/// Replay every record into the index and overwrite the snapshot.
pub async fn reindex(config: &RecollectConfig) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg}")
            .context("invalid progress template")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("opening store...");

    let store = super::open_offline_store(config)?;

    pb.set_message("rebuilding index from records...");
    let paths = config.resolved_snapshot_paths();
    let count = store
        .reindex()
        .await
        .with_context(|| format!("failed to rebuild index into {}", paths.vectors.display()))?;
    pb.finish_and_clear();

    let total = store.records().count()?;
    println!("Indexed {count} of {total} records.");
    if (count as u64) < total {
        println!("  {} record(s) skipped with invalid embeddings (see log).", total - count as u64);
    }
    println!("Snapshot written to {}", paths.vectors.display());
    Ok(())
}
