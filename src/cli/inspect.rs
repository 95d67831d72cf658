//! CLI `inspect` command — display a single stored record.

use anyhow::Result;

use crate::config::RecollectConfig;

/// Print the full record for `id`.
pub fn inspect(config: &RecollectConfig, id: &str) -> Result<()> {
    let records = super::open_records(config)?;
    let record = records.get_by_id(id)?;

    println!("Memory: {}", record.id);
    println!("{}", "=".repeat(50));
    println!("  Created:        {}", record.created_at);
    if let Some(ref session) = record.session_id {
        println!("  Session:        {session}");
    }
    println!("  Dimensions:     {}", record.embedding.len());
    println!();
    println!("Content:");
    println!("  {}", record.content);

    Ok(())
}
