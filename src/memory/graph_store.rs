// file: src/memory/graph_store.rs
// description: memory store persisted as :Memory nodes in Neo4j

use crate::database::GraphClient;
use crate::database::operations::{self, NewMemory};
use crate::error::Result;
use crate::memory::MemoryStore;
use crate::models::{Memory, Metadata};
use async_trait::async_trait;
use chrono::{Duration, Local};
use std::sync::Arc;
use tracing::debug;

pub struct GraphMemoryStore {
    graph: Arc<dyn GraphClient>,
}

impl GraphMemoryStore {
    pub fn new(graph: Arc<dyn GraphClient>) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &Arc<dyn GraphClient> {
        &self.graph
    }
}

#[async_trait]
impl MemoryStore for GraphMemoryStore {
    /// Substring search first; when nothing matches, the most recent memories.
    async fn retrieve_relevant(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let mut found = operations::search_memories(self.graph.as_ref(), query, limit).await;
        if found.is_empty() {
            debug!("No memories matched '{}', falling back to recent memories", query);
            found = operations::retrieve_memories(self.graph.as_ref(), limit).await;
        }
        Ok(found.iter().map(Memory::display_line).collect())
    }

    async fn store_conversation(
        &mut self,
        user_message: &str,
        assistant_message: &str,
    ) -> Result<()> {
        let now = Local::now();
        let graph = self.graph.as_ref();

        operations::store_memory(graph, NewMemory::new(user_message, "user").at(now)).await?;
        operations::store_memory(
            graph,
            NewMemory::new(assistant_message, "assistant").at(now + Duration::milliseconds(100)),
        )
        .await?;
        Ok(())
    }

    async fn store_document(
        &mut self,
        content: &str,
        source: &str,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        let memory = NewMemory::new(content, source).with_metadata(metadata.unwrap_or_default());
        operations::store_memory(self.graph.as_ref(), memory).await?;
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        operations::clear_memories(self.graph.as_ref()).await
    }
}
