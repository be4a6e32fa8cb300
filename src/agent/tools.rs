// file: src/agent/tools.rs
// description: tools the model may call during a turn
// reference: https://platform.openai.com/docs/guides/function-calling

use crate::llm::{ToolCall, ToolDefinition};
use crate::memory::MemoryStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

pub const MEMORY_SEARCH: &str = "memory_search";

const DEFAULT_SEARCH_LIMIT: usize = 5;

fn default_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

#[derive(Debug, Deserialize)]
struct MemorySearchArgs {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

pub fn memory_search_tool() -> ToolDefinition {
    ToolDefinition::function(
        MEMORY_SEARCH,
        "Search for information in the memory system",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of memories to retrieve",
                    "default": DEFAULT_SEARCH_LIMIT
                }
            },
            "required": ["query"]
        }),
    )
}

/// Runs one tool call. Failures become an `{"error": ...}` payload for the
/// model instead of aborting the turn.
pub async fn dispatch(memory: &dyn MemoryStore, call: &ToolCall) -> Value {
    debug!("Tool call {}: {}", call.function.name, call.function.arguments);

    match call.function.name.as_str() {
        MEMORY_SEARCH => memory_search(memory, &call.function.arguments).await,
        other => {
            warn!("Model requested unknown tool: {}", other);
            json!({ "error": format!("Unknown tool: {}", other) })
        }
    }
}

async fn memory_search(memory: &dyn MemoryStore, arguments: &str) -> Value {
    let args: MemorySearchArgs = match serde_json::from_str(arguments) {
        Ok(args) => args,
        Err(e) => return json!({ "error": format!("Invalid arguments for {}: {}", MEMORY_SEARCH, e) }),
    };

    match memory.retrieve_relevant(&args.query, args.limit).await {
        Ok(memories) => json!({
            "count": memories.len(),
            "memories": memories,
        }),
        Err(e) => json!({ "error": e.to_string() }),
    }
}
