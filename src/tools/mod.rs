pub mod memory_query;
pub mod memory_save;

use memory_query::MemoryQueryParams;
use memory_save::MemorySaveParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use std::sync::Arc;

use crate::config::RecollectConfig;
use crate::memory::store::MemoryStore;
use crate::memory::types::{QueryResponse, SaveResponse};

/// The recollect MCP tool handler. Holds the shared memory store and config
/// and exposes `memory_save` / `memory_query` via the `#[tool_router]` macro.
///
/// Both tools always answer with a structured response; failures are reported
/// in its `status` field rather than as protocol errors.
#[derive(Clone)]
pub struct RecollectTools {
    tool_router: ToolRouter<Self>,
    store: Arc<MemoryStore>,
    config: Arc<RecollectConfig>,
}

/// Clamp a requested `k` into `1..=max_k`, falling back to `default_k`.
fn effective_k(requested: Option<usize>, config: &RecollectConfig) -> usize {
    requested
        .unwrap_or(config.retrieval.default_k)
        .clamp(1, config.retrieval.max_k.max(1))
}

#[tool_router]
impl RecollectTools {
    pub fn new(store: Arc<MemoryStore>, config: Arc<RecollectConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            store,
            config,
        }
    }

    /// Save text to long-term memory.
    #[tool(description = "Save any text (user query, agent response, web search result) to long-term memory for future recall.")]
    async fn memory_save(
        &self,
        Parameters(params): Parameters<MemorySaveParams>,
    ) -> Result<String, String> {
        tracing::info!(
            content_len = params.text.len(),
            session = params.session.as_deref().unwrap_or("-"),
            "memory_save called"
        );

        let result = self
            .store
            .save_in_session(&params.text, params.session.as_deref())
            .await;
        if let Err(ref e) = result {
            tracing::warn!(error = %e, "memory_save failed");
        }

        let response = SaveResponse::from(result);
        serde_json::to_string(&response).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Search long-term memory for text similar to the query.
    #[tool(description = "Search long-term memory for entries semantically similar to the given text. Returns ranked results with similarity scores.")]
    async fn memory_query(
        &self,
        Parameters(params): Parameters<MemoryQueryParams>,
    ) -> Result<String, String> {
        let k = effective_k(params.k, &self.config);
        tracing::info!(query_len = params.text.len(), k, "memory_query called");

        let result = self.store.query(&params.text, k).await;
        if let Err(ref e) = result {
            tracing::warn!(error = %e, "memory_query failed");
        }

        let response = QueryResponse::from(result);
        if params.as_text.unwrap_or(false) {
            return Ok(response.render(&params.text));
        }
        serde_json::to_string(&response).map_err(|e| format!("serialization failed: {e}"))
    }
}

#[tool_handler]
impl ServerHandler for RecollectTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "recollect is a long-term semantic memory server. Save user queries and your \
                 answers with memory_save, and search past context with memory_query before \
                 answering."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn k_defaults_and_clamps() {
        let config = RecollectConfig::default();
        assert_eq!(effective_k(None, &config), 3);
        assert_eq!(effective_k(Some(0), &config), 1);
        assert_eq!(effective_k(Some(7), &config), 7);
        assert_eq!(effective_k(Some(10_000), &config), config.retrieval.max_k);
    }
}
