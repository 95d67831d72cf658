//! CLI `save` command — store a text from the terminal.

use anyhow::Result;

use crate::config::RecollectConfig;
use crate::memory::types::{SaveResponse, SaveStatus};

/// Embed and store `text`, printing the new record id.
pub async fn save(config: &RecollectConfig, text: &str, session: Option<&str>) -> Result<()> {
    let store = crate::server::open_store(config)?;
    let response = SaveResponse::from(store.save_in_session(text, session).await);

    match response.status {
        SaveStatus::Success => {
            println!("{}", response.message);
            if let Some(id) = response.record_id {
                println!("  id: {id}");
            }
            Ok(())
        }
        SaveStatus::Error => anyhow::bail!("{}", response.message),
    }
}
