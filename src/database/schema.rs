// file: src/database/schema.rs
// description: Neo4j index management for the knowledge graph
// reference: https://neo4j.com/docs/cypher-manual/current/indexes/

use crate::database::GraphClient;
use crate::database::statement::Statement;
use crate::error::Result;
use tracing::{error, info};

const INDEXES: &[(&str, &str, &str)] = &[
    ("memory_id", "m:Memory", "m.id"),
    ("document_id", "d:Document", "d.id"),
    ("entity_name", "e:Entity", "e.name"),
    ("topic_name", "t:Topic", "t.name"),
];

pub struct SchemaManager<'a, G: GraphClient + ?Sized> {
    client: &'a G,
}

impl<'a, G: GraphClient + ?Sized> SchemaManager<'a, G> {
    pub fn new(client: &'a G) -> Self {
        Self { client }
    }

    pub fn index_statements() -> Vec<Statement> {
        INDEXES
            .iter()
            .map(|(name, pattern, property)| {
                Statement::new(format!(
                    "CREATE INDEX {} IF NOT EXISTS FOR ({}) ON ({})",
                    name, pattern, property
                ))
            })
            .collect()
    }

    pub async fn create_indexes(&self) -> Result<()> {
        for stmt in Self::index_statements() {
            self.client.execute(stmt).await?;
        }
        info!("Created database indexes");
        Ok(())
    }

    pub async fn setup_database(&self) -> Result<()> {
        match self.create_indexes().await {
            Ok(()) => {
                info!("Database setup complete");
                Ok(())
            }
            Err(e) => {
                error!("Error setting up database: {}", e);
                Err(e)
            }
        }
    }
}
