// file: src/database/client.rs
// description: Neo4j connection manager over the Bolt protocol
// reference: https://docs.rs/neo4rs

use crate::config::DatabaseConfig;
use crate::database::GraphClient;
use crate::database::statement::{ParamValue, Statement};
use crate::error::{MindGardenError, Result};
use crate::models::{Memory, MemoryNode};
use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Node, Query, query};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

pub struct Neo4jManager {
    config: DatabaseConfig,
    graph: OnceCell<Graph>,
}

impl Neo4jManager {
    pub fn new(config: DatabaseConfig) -> Self {
        info!(
            "Neo4jManager initialized with URI: {}, User: {}",
            config.uri, config.user
        );
        Self {
            config,
            graph: OnceCell::new(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.config.uri
    }

    /// Returns the connection pool, creating it on first use.
    pub async fn connect(&self) -> Result<&Graph> {
        if self.config.password.is_empty() {
            return Err(MindGardenError::Config(
                "Neo4j password is required".to_string(),
            ));
        }

        self.graph
            .get_or_try_init(|| async {
                let mut builder = ConfigBuilder::default()
                    .uri(self.config.uri.as_str())
                    .user(self.config.user.as_str())
                    .password(self.config.password.as_str())
                    .max_connections(self.config.max_connections);

                if let Some(name) = &self.config.name {
                    builder = builder.db(name.as_str());
                }

                let driver_config = builder.build().map_err(|e| {
                    MindGardenError::Config(format!("Invalid Neo4j configuration: {}", e))
                })?;

                let graph = Graph::connect(driver_config).await.map_err(|e| {
                    error!("Failed to connect to Neo4j: {}", e);
                    MindGardenError::Database(format!("Failed to connect to Neo4j: {}", e))
                })?;

                info!("Connected to Neo4j at {}", self.config.uri);
                Ok::<Graph, MindGardenError>(graph)
            })
            .await
    }

    pub async fn ping(&self) -> Result<bool> {
        debug!("Checking Neo4j connection");
        let count = self
            .fetch_count(Statement::new("RETURN 1 AS count"), "count")
            .await?;
        Ok(count == 1)
    }

    fn to_query(stmt: &Statement) -> Query {
        stmt.params
            .iter()
            .fold(query(&stmt.text), |q, (key, value)| match value {
                ParamValue::String(s) => q.param(key, s.clone()),
                ParamValue::Int(i) => q.param(key, *i),
                ParamValue::Float(f) => q.param(key, *f),
                ParamValue::Bool(b) => q.param(key, *b),
                ParamValue::StringList(items) => q.param(key, items.clone()),
            })
    }

    fn query_failed(stmt: &Statement, e: impl std::fmt::Display) -> MindGardenError {
        error!("Error executing query: {}", e);
        error!("Query: {}", stmt.text.trim());
        debug!("Parameters: {:?}", stmt.params);
        MindGardenError::Database(format!("Query failed: {}", e))
    }
}

#[async_trait]
impl GraphClient for Neo4jManager {
    async fn execute(&self, stmt: Statement) -> Result<()> {
        let graph = self.connect().await?;
        graph
            .run(Self::to_query(&stmt))
            .await
            .map_err(|e| Self::query_failed(&stmt, e))
    }

    async fn fetch_memories(&self, stmt: Statement, column: &str) -> Result<Vec<Memory>> {
        let graph = self.connect().await?;
        let mut rows = graph
            .execute(Self::to_query(&stmt))
            .await
            .map_err(|e| Self::query_failed(&stmt, e))?;

        let mut memories = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| Self::query_failed(&stmt, e))? {
            let node: Node = match row.get(column) {
                Ok(node) => node,
                Err(e) => {
                    warn!("Row has no node in column '{}': {}", column, e);
                    continue;
                }
            };

            match node.to::<MemoryNode>() {
                Ok(record) => memories.push(Memory::from(record)),
                Err(e) => error!("Error creating Memory object: {}", e),
            }
        }

        Ok(memories)
    }

    async fn fetch_count(&self, stmt: Statement, column: &str) -> Result<i64> {
        let graph = self.connect().await?;
        let mut rows = graph
            .execute(Self::to_query(&stmt))
            .await
            .map_err(|e| Self::query_failed(&stmt, e))?;

        match rows.next().await.map_err(|e| Self::query_failed(&stmt, e))? {
            Some(row) => row.get::<i64>(column).map_err(|e| {
                MindGardenError::Database(format!("Missing '{}' column: {}", column, e))
            }),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_connect_requires_password() {
        let mut config = Config::default_config().database;
        config.password = String::new();

        let manager = Neo4jManager::new(config);
        let result = manager.connect().await;

        assert!(matches!(result, Err(MindGardenError::Config(_))));
    }

    #[test]
    fn test_manager_reports_uri() {
        let manager = Neo4jManager::new(Config::default_config().database);
        assert_eq!(manager.uri(), "bolt://localhost:7687");
    }
}
