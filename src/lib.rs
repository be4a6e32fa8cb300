// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod agent;
pub mod config;
pub mod database;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod memory;
pub mod models;
pub mod utils;

pub use agent::Agent;
pub use config::{AgentConfig, Config, DatabaseConfig, MemoryBackend, OpenAiConfig};
pub use database::{GraphClient, Neo4jManager, SchemaManager, Statement};
pub use error::{MindGardenError, Result};
pub use extractor::EntityProcessor;
pub use llm::{ChatModel, OpenAiClient};
pub use memory::{GraphMemoryStore, MemoryManager, MemoryStore};
pub use models::{ConversationTurn, Entity, ExtractedEntities, Memory, MemoryItem, Relationship};
pub use utils::{HealthReport, HealthStatus, OperationTimer, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        let _manager = MemoryManager::new();
        assert_eq!(config.agent.name, "Quinn");
    }
}
