// file: src/memory/manager.rs
// description: in-process memory store kept for the lifetime of a session

use crate::error::Result;
use crate::memory::MemoryStore;
use crate::models::memory::unix_seconds;
use crate::models::{MemoryItem, Metadata};
use async_trait::async_trait;
use chrono::Local;
use std::cmp::Ordering;
use tracing::{debug, info};

/// Offset applied to an assistant reply so it sorts after the message it answers.
const REPLY_OFFSET_SECS: f64 = 0.1;

#[derive(Debug, Default)]
pub struct MemoryManager {
    memories: Vec<MemoryItem>,
    next_sequence: u64,
}

impl MemoryManager {
    pub fn new() -> Self {
        info!("Initialized in-process memory manager");
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    pub fn items(&self) -> &[MemoryItem] {
        &self.memories
    }

    fn push(&mut self, mut item: MemoryItem) {
        item.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.memories.push(item);
    }

    fn newest_first(&self) -> Vec<&MemoryItem> {
        let mut sorted: Vec<&MemoryItem> = self.memories.iter().collect();
        sorted.sort_by(|a, b| {
            b.timestamp
                .partial_cmp(&a.timestamp)
                .unwrap_or(Ordering::Equal)
                .then(b.sequence.cmp(&a.sequence))
        });
        sorted
    }
}

#[async_trait]
impl MemoryStore for MemoryManager {
    /// The query is not used; recency is the only ranking available in-process.
    async fn retrieve_relevant(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        debug!("Retrieving up to {} memories for query: {}", limit, query);
        Ok(self
            .newest_first()
            .into_iter()
            .take(limit)
            .map(MemoryItem::display_line)
            .collect())
    }

    async fn store_conversation(
        &mut self,
        user_message: &str,
        assistant_message: &str,
    ) -> Result<()> {
        let timestamp = unix_seconds(Local::now());
        let user = MemoryItem::new(user_message, "user", timestamp);

        let mut assistant =
            MemoryItem::new(assistant_message, "assistant", timestamp + REPLY_OFFSET_SECS);
        assistant.date = user.date.clone();

        self.push(user);
        self.push(assistant);
        debug!("Stored conversation exchange ({} memories)", self.memories.len());
        Ok(())
    }

    async fn store_document(
        &mut self,
        content: &str,
        source: &str,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        let item = MemoryItem::new(content, source, unix_seconds(Local::now()))
            .with_metadata(metadata.unwrap_or_default());
        self.push(item);
        debug!("Stored document from {}", source);
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        self.memories.clear();
        info!("Cleared in-process memories");
        Ok(())
    }
}
