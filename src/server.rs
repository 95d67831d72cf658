//! MCP server initialization for the stdio transport.
//!
//! [`serve_stdio`] wires up the embedding provider, the memory store, and the
//! MCP tool handler into a running server.

use crate::config::RecollectConfig;
use crate::embedding;
use crate::memory::store::MemoryStore;
use crate::tools::RecollectTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::Arc;

/// Shared setup: create the embedding provider and open the memory store.
pub fn open_store(config: &RecollectConfig) -> Result<Arc<MemoryStore>> {
    let provider = embedding::create_provider(&config.embedding)?;
    let embedder: Arc<dyn embedding::EmbeddingProvider> = Arc::from(provider);

    let store = MemoryStore::open(config, embedder)?;
    Ok(Arc::new(store))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: RecollectConfig) -> Result<()> {
    tracing::info!("starting recollect MCP server on stdio");

    let store = open_store(&config)?;
    let tools = RecollectTools::new(store, Arc::new(config));
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}
