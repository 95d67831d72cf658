//! MCP `memory_query` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `memory_query` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MemoryQueryParams {
    /// Natural language text to search memory with.
    #[schemars(description = "Natural language text to search memory with")]
    pub text: String,

    /// Maximum number of memories to return. Defaults to 3.
    #[schemars(description = "Maximum number of memories to return. Defaults to 3.")]
    pub k: Option<usize>,

    /// If `true`, return the plain-text listing instead of JSON.
    #[schemars(
        description = "If true, return a plain-text listing ('Found N relevant memories...') instead of the JSON response."
    )]
    pub as_text: Option<bool>,
}
