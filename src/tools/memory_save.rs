//! MCP `memory_save` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MemorySaveParams {
    #[schemars(description = "The text to save to long-term memory (user query, agent answer, fact, web result)")]
    pub text: String,

    #[schemars(description = "Optional session/conversation id to tag the memory with")]
    pub session: Option<String>,
}
