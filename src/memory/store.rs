// file: src/memory/store.rs
// description: the memory store abstraction consumed by the agent

use crate::error::Result;
use crate::models::Metadata;
use async_trait::async_trait;

/// Where the agent keeps what it has heard and said.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Memories formatted as `"<text> [From: <source>]"`, newest first.
    async fn retrieve_relevant(&self, query: &str, limit: usize) -> Result<Vec<String>>;

    /// Stores a user message and the reply to it, in that order.
    async fn store_conversation(&mut self, user_message: &str, assistant_message: &str)
    -> Result<()>;

    async fn store_document(
        &mut self,
        content: &str,
        source: &str,
        metadata: Option<Metadata>,
    ) -> Result<()>;

    async fn clear(&mut self) -> Result<()>;
}
