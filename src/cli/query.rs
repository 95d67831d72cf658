use anyhow::Result;

use crate::config::RecollectConfig;
use crate::memory::types::{QueryResponse, QueryStatus};

/// Run a similarity query from the terminal.
pub async fn query(config: &RecollectConfig, text: &str, k: Option<usize>, json: bool) -> Result<()> {
    let store = crate::server::open_store(config)?;
    let k = k.unwrap_or(config.retrieval.default_k);

    let response = QueryResponse::from(store.query(text, k).await);

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.render(text));
    }

    if response.status == QueryStatus::Error {
        anyhow::bail!("query failed");
    }
    Ok(())
}
