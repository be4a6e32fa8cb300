// file: src/database/mod.rs
// description: graph database operations module exports
// reference: internal module structure

pub mod client;
pub mod operations;
pub mod schema;
pub mod statement;

use crate::error::Result;
use crate::models::Memory;
use async_trait::async_trait;

pub use client::Neo4jManager;
pub use schema::SchemaManager;
pub use statement::{ParamValue, Statement};

/// Executes Cypher statements. Implemented by [`Neo4jManager`]; tests
/// substitute a recording fake.
#[async_trait]
pub trait GraphClient: Send + Sync {
    async fn execute(&self, stmt: Statement) -> Result<()>;

    /// Runs `stmt` and decodes the `:Memory` node found in `column` of each row.
    async fn fetch_memories(&self, stmt: Statement, column: &str) -> Result<Vec<Memory>>;

    /// Runs `stmt` and reads an integer from `column` of the first row.
    async fn fetch_count(&self, stmt: Statement, column: &str) -> Result<i64>;
}
