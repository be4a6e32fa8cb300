// file: src/memory/mod.rs
// description: memory stores module exports
// reference: internal module structure

pub mod graph_store;
pub mod manager;
pub mod store;

pub use graph_store::GraphMemoryStore;
pub use manager::MemoryManager;
pub use store::MemoryStore;
