use anyhow::Result;

use crate::config::RecollectConfig;

/// Display record, index and cache statistics in the terminal.
///
/// Opening the store loads the index snapshot, rebuilding it first if it is
/// missing or out of date.
pub async fn stats(config: &RecollectConfig) -> Result<()> {
    let store = super::open_offline_store(config)?;
    let stats = store.stats().await?;

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Records:             {}", stats.records);
    println!("  Indexed vectors:     {}", stats.indexed_vectors);
    println!("  Dimensions:          {}", stats.dimensions);
    println!(
        "  Index snapshot:      {}",
        config.resolved_snapshot_paths().vectors.display()
    );

    if let Some(ref oldest) = stats.oldest_record {
        println!("  Oldest record:       {oldest}");
    }
    if let Some(ref newest) = stats.newest_record {
        println!("  Newest record:       {newest}");
    }

    if (stats.indexed_vectors as u64) < stats.records {
        println!();
        println!(
            "  {} record(s) have unreadable embeddings and are not searchable.",
            stats.records - stats.indexed_vectors as u64
        );
    }

    Ok(())
}
