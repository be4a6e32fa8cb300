// file: src/database/operations.rs
// description: memory, entity, relationship and topic operations on the knowledge graph
// reference: https://neo4j.com/docs/cypher-manual/current/clauses/merge/

use crate::database::GraphClient;
use crate::database::statement::Statement;
use crate::error::Result;
use crate::models::memory::{DATE_FORMAT, Metadata, unix_seconds};
use crate::models::{Entity, Memory, Relationship};
use crate::utils::validation::Validator;
use chrono::{DateTime, Local};
use tracing::{debug, error, info};
use uuid::Uuid;

const CREATE_MEMORY: &str = "
CREATE (m:Memory {
    id: $id,
    content: $content,
    source: $source,
    timestamp: $timestamp,
    date_str: $date_str,
    metadata_json: $metadata_json
})
RETURN m.id AS id";

const RECENT_MEMORIES: &str = "
MATCH (m:Memory)
RETURN m
ORDER BY m.timestamp DESC
LIMIT $limit";

const SEARCH_MEMORIES: &str = "
MATCH (m:Memory)
WHERE m.content CONTAINS $query_text
RETURN m
ORDER BY m.timestamp DESC
LIMIT $limit";

const MEMORIES_BY_ENTITY: &str = "
MATCH (m:Memory)-[:MENTIONS]->(e:Entity {name: $entity_name})
RETURN m
ORDER BY m.timestamp DESC
LIMIT $limit";

const LINK_ENTITY: &str = "
MATCH (m:Memory {id: $memory_id})
MATCH (e:Entity {name: $entity_name})
MERGE (m)-[r:MENTIONS]->(e)
RETURN r";

const LINK_TOPIC: &str = "
MATCH (m:Memory {id: $memory_id})
MERGE (t:Topic {name: $topic})
MERGE (m)-[r:ABOUT]->(t)
RETURN r";

const MERGE_ENTITY: &str = "
MERGE (e:Entity {name: $name})
ON CREATE SET e.entity_type = $entity_type,
              e.aliases = $aliases,
              e.description = $description,
              e.created_at = timestamp()
ON MATCH SET e.entity_type = $entity_type,
             e.aliases = $aliases,
             e.description = $description,
             e.updated_at = timestamp()
RETURN e";

const MERGE_TOPIC: &str = "
MERGE (t:Topic {name: $name})
ON CREATE SET t.created_at = timestamp()
ON MATCH SET t.updated_at = timestamp()
RETURN t";

/// A memory about to be written; `created_at` defaults to now.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub content: String,
    pub source: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Local>,
}

impl NewMemory {
    pub fn new(content: &str, source: &str) -> Self {
        Self {
            content: content.to_string(),
            source: source.to_string(),
            metadata: Metadata::new(),
            created_at: Local::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn at(mut self, created_at: DateTime<Local>) -> Self {
        self.created_at = created_at;
        self
    }
}

pub fn create_memory_statement(id: &str, memory: &NewMemory) -> Result<Statement> {
    let metadata_json = serde_json::to_string(&memory.metadata)?;

    Ok(Statement::new(CREATE_MEMORY)
        .param("id", id)
        .param("content", memory.content.as_str())
        .param("source", memory.source.as_str())
        .param("timestamp", unix_seconds(memory.created_at))
        .param(
            "date_str",
            memory.created_at.format(DATE_FORMAT).to_string(),
        )
        .param("metadata_json", metadata_json))
}

/// Creates a `:Memory` node and returns its id. Errors propagate.
pub async fn store_memory<G: GraphClient + ?Sized>(graph: &G, memory: NewMemory) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    let stmt = create_memory_statement(&id, &memory)?;

    match graph.execute(stmt).await {
        Ok(()) => {
            info!("Stored memory {} from {}", id, memory.source);
            Ok(id)
        }
        Err(e) => {
            error!("Error storing memory: {}", e);
            Err(e)
        }
    }
}

async fn fetch_or_empty<G: GraphClient + ?Sized>(
    graph: &G,
    stmt: Statement,
    action: &str,
) -> Vec<Memory> {
    match graph.fetch_memories(stmt, "m").await {
        Ok(memories) => memories,
        Err(e) => {
            error!("Error {}: {}", action, e);
            Vec::new()
        }
    }
}

/// Most recent memories first. Failures are logged and yield an empty list.
pub async fn retrieve_memories<G: GraphClient + ?Sized>(graph: &G, limit: usize) -> Vec<Memory> {
    let stmt = Statement::new(RECENT_MEMORIES).param("limit", limit);
    fetch_or_empty(graph, stmt, "retrieving memories").await
}

/// Substring match on content, most recent first.
pub async fn search_memories<G: GraphClient + ?Sized>(
    graph: &G,
    query_text: &str,
    limit: usize,
) -> Vec<Memory> {
    let stmt = Statement::new(SEARCH_MEMORIES)
        .param("query_text", query_text)
        .param("limit", limit);
    fetch_or_empty(graph, stmt, "searching memories").await
}

pub async fn retrieve_memories_by_entity<G: GraphClient + ?Sized>(
    graph: &G,
    entity_name: &str,
    limit: usize,
) -> Vec<Memory> {
    let stmt = Statement::new(MEMORIES_BY_ENTITY)
        .param("entity_name", entity_name)
        .param("limit", limit);
    fetch_or_empty(graph, stmt, "retrieving memories by entity").await
}

/// Links a memory to already-stored entities. A failing link is logged
/// and the remaining names are still processed.
pub async fn connect_memory_to_entities<G: GraphClient + ?Sized>(
    graph: &G,
    memory_id: &str,
    entity_names: &[String],
) {
    for entity_name in entity_names {
        let stmt = Statement::new(LINK_ENTITY)
            .param("memory_id", memory_id)
            .param("entity_name", entity_name.as_str());

        match graph.execute(stmt).await {
            Ok(()) => debug!("Connected memory {} to entity {}", memory_id, entity_name),
            Err(e) => error!("Error connecting memory to entity: {}", e),
        }
    }
}

pub async fn connect_memory_to_topics<G: GraphClient + ?Sized>(
    graph: &G,
    memory_id: &str,
    topics: &[String],
) {
    for topic in topics {
        let stmt = Statement::new(LINK_TOPIC)
            .param("memory_id", memory_id)
            .param("topic", topic.as_str());

        match graph.execute(stmt).await {
            Ok(()) => debug!("Connected memory {} to topic {}", memory_id, topic),
            Err(e) => error!("Error connecting memory to topic: {}", e),
        }
    }
}

pub async fn clear_memories<G: GraphClient + ?Sized>(graph: &G) -> Result<()> {
    graph
        .execute(Statement::new("MATCH (m:Memory) DETACH DELETE m"))
        .await?;
    info!("Cleared all memories from the graph");
    Ok(())
}

pub async fn count_memories<G: GraphClient + ?Sized>(graph: &G) -> Result<i64> {
    graph
        .fetch_count(
            Statement::new("MATCH (m:Memory) RETURN count(m) AS count"),
            "count",
        )
        .await
}

pub fn entity_statement(entity: &Entity) -> Statement {
    Statement::new(MERGE_ENTITY)
        .param("name", entity.name.as_str())
        .param("entity_type", entity.entity_type.as_str())
        .param("aliases", entity.aliases.clone())
        .param(
            "description",
            entity.description.clone().unwrap_or_default(),
        )
}

/// The relationship type cannot be a Cypher parameter, so it is sanitized
/// before being placed in the query text.
pub fn relationship_statement(relationship: &Relationship) -> Statement {
    let rel_type = Validator::sanitize_relationship_type(&relationship.relationship_type);
    let text = format!(
        "
MATCH (source:Entity {{name: $source}})
MATCH (target:Entity {{name: $target}})
MERGE (source)-[r:{rel_type}]->(target)
ON CREATE SET r.description = $description,
              r.confidence = $confidence,
              r.created_at = timestamp()
ON MATCH SET r.description = $description,
             r.confidence = $confidence,
             r.updated_at = timestamp()
RETURN r"
    );

    Statement::new(text)
        .param("source", relationship.source.as_str())
        .param("target", relationship.target.as_str())
        .param(
            "description",
            relationship.description.clone().unwrap_or_default(),
        )
        .param("confidence", relationship.confidence)
}

pub fn topic_statement(topic: &str) -> Statement {
    Statement::new(MERGE_TOPIC).param("name", topic)
}
