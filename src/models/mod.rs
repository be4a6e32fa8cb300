// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod conversation;
pub mod entity;
pub mod memory;

pub use conversation::{AgentState, ConversationTurn, Role};
pub use entity::{Entity, ExtractedEntities, Relationship};
pub use memory::{Memory, MemoryItem, MemoryNode, Metadata};
