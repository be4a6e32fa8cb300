// file: src/extractor/entity.rs
// description: LLM-driven extraction of entities, relationships and topics into the knowledge graph
// reference: https://platform.openai.com/docs/guides/structured-outputs/json-mode

use crate::database::GraphClient;
use crate::database::operations::{
    connect_memory_to_entities, connect_memory_to_topics, entity_statement,
    relationship_statement, topic_statement,
};
use crate::error::{MindGardenError, Result};
use crate::extractor::patterns::strip_code_fence;
use crate::llm::{ChatCompletionRequest, ChatMessage, ChatModel, ResponseFormat};
use crate::models::{Entity, ExtractedEntities};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const SYSTEM_PROMPT: &str = "You are an expert text analysis assistant. \
Extract all relevant entities, topics, and relationships from the text. \
For entities, identify their 'name', 'entity_type', and optionally 'aliases' and 'description'. \
For topics, identify the main subjects discussed. \
For relationships, identify connections between entities with 'source', 'target', \
'relationship_type', and optionally 'description'. \
Respond with a JSON object with the keys 'entities', 'relationships' and 'topics'.";

const EXTRACTION_TEMPERATURE: f32 = 0.2;
const MAX_CONCURRENT_WRITES: usize = 4;

pub struct EntityProcessor {
    model: Arc<dyn ChatModel>,
    graph: Option<Arc<dyn GraphClient>>,
}

impl EntityProcessor {
    pub fn new(model: Arc<dyn ChatModel>, graph: Option<Arc<dyn GraphClient>>) -> Self {
        info!(
            "EntityProcessor initialized (model: {}, graph: {})",
            model.model_name(),
            graph.is_some()
        );
        Self { model, graph }
    }

    pub fn extraction_request(&self, text: &str, instructions: &str) -> ChatCompletionRequest {
        let user_prompt = format!("Text: {}\nInstructions: {}", text, instructions);
        let mut request = ChatCompletionRequest::new(
            self.model.model_name(),
            vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(&user_prompt)],
        );
        request.temperature = Some(EXTRACTION_TEMPERATURE);
        request.response_format = Some(ResponseFormat::json_object());
        request
    }

    /// Never fails: problems are logged and produce an empty result.
    pub async fn extract_entities_from_text(
        &self,
        text: &str,
        instructions: &str,
    ) -> ExtractedEntities {
        match self.try_extract(text, instructions).await {
            Ok(extracted) => {
                debug!(
                    "Extracted {} entities, {} relationships, {} topics",
                    extracted.entities.len(),
                    extracted.relationships.len(),
                    extracted.topics.len()
                );
                extracted
            }
            Err(e) => {
                error!("Error extracting entities: {}", e);
                ExtractedEntities::default()
            }
        }
    }

    async fn try_extract(&self, text: &str, instructions: &str) -> Result<ExtractedEntities> {
        let response = self
            .model
            .chat(self.extraction_request(text, instructions))
            .await?;

        let content = response
            .first_message()
            .and_then(|message| message.content.as_deref())
            .ok_or_else(|| MindGardenError::Extraction("empty model response".to_string()))?;

        parse_extraction(content)
    }

    /// Writes entities, then relationships, then topics. Without a graph
    /// this only logs a warning.
    pub async fn store_entities(&self, extracted: &ExtractedEntities) -> Result<()> {
        let Some(graph) = &self.graph else {
            warn!("Neo4j manager not available, skipping entity storage");
            return Ok(());
        };
        let graph = graph.as_ref();

        let entities = unique_by_name(&extracted.entities);
        if entities.len() < extracted.entities.len() {
            debug!(
                "Merged {} duplicate entity names before storing",
                extracted.entities.len() - entities.len()
            );
        }

        stream::iter(entities)
            .map(|entity| graph.execute(entity_statement(entity)))
            .buffer_unordered(MAX_CONCURRENT_WRITES)
            .try_collect::<Vec<()>>()
            .await?;

        for relationship in &extracted.relationships {
            graph.execute(relationship_statement(relationship)).await?;
        }

        for topic in &extracted.topics {
            graph.execute(topic_statement(topic)).await?;
        }

        info!(
            "Stored {} entities, {} relationships, {} topics",
            extracted.entities.len(),
            extracted.relationships.len(),
            extracted.topics.len()
        );
        Ok(())
    }

    /// Links a stored memory to the extracted entities and topics.
    pub async fn link_memory(&self, memory_id: &str, extracted: &ExtractedEntities) {
        let Some(graph) = &self.graph else {
            warn!("Neo4j manager not available, skipping memory links");
            return;
        };

        connect_memory_to_entities(graph.as_ref(), memory_id, &extracted.entity_names()).await;
        connect_memory_to_topics(graph.as_ref(), memory_id, &extracted.topics).await;
    }
}

/// One entity per name, keeping the last occurrence. Concurrent `MERGE`s on
/// the same name could otherwise create duplicate nodes.
fn unique_by_name(entities: &[Entity]) -> Vec<&Entity> {
    let latest: HashMap<&str, usize> = entities
        .iter()
        .enumerate()
        .map(|(i, entity)| (entity.name.as_str(), i))
        .collect();

    entities
        .iter()
        .enumerate()
        .filter(|(i, entity)| latest.get(entity.name.as_str()) == Some(i))
        .map(|(_, entity)| entity)
        .collect()
}

pub fn parse_extraction(content: &str) -> Result<ExtractedEntities> {
    serde_json::from_str(strip_code_fence(content))
        .map_err(|e| MindGardenError::Extraction(format!("invalid extraction JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ParamValue;
    use crate::database::testing::RecordingGraph;
    use crate::llm::MessageRole;
    use crate::llm::testing::ScriptedModel;
    use crate::models::Relationship;
    use pretty_assertions::assert_eq;

    const REPLY: &str = r#"{
        "entities": [
            {"name": "Ada Lovelace", "entity_type": "person", "aliases": ["Ada"]},
            {"entity_type": "place"}
        ],
        "relationships": [
            {"source": "Ada Lovelace", "target": "Charles Babbage", "relationship_type": "worked with"}
        ],
        "topics": ["computing"]
    }"#;

    fn sample() -> ExtractedEntities {
        ExtractedEntities {
            entities: vec![Entity::new("Ada", "person"), Entity::new("Babbage", "person")],
            relationships: vec![Relationship::new("Ada", "Babbage", "knows")],
            topics: vec!["engines".to_string()],
        }
    }

    #[test]
    fn test_parse_extraction_defaults() {
        let extracted = parse_extraction(REPLY).unwrap();

        assert_eq!(extracted.entities[0].aliases, vec!["Ada".to_string()]);
        assert_eq!(extracted.entities[1].name, "Unknown");
        assert_eq!(extracted.relationships[0].confidence, 1.0);
        assert_eq!(extracted.topics, vec!["computing".to_string()]);
    }

    #[test]
    fn test_parse_extraction_tolerates_fences() {
        let fenced = format!("```json\n{}\n```", REPLY);
        assert_eq!(parse_extraction(&fenced).unwrap().entities.len(), 2);
        assert!(parse_extraction("not json").is_err());
    }

    #[tokio::test]
    async fn test_extraction_request_shape() {
        let model = Arc::new(ScriptedModel::new().reply(REPLY));
        let processor = EntityProcessor::new(model.clone(), None);

        let extracted = processor
            .extract_entities_from_text("Ada met Babbage.", "people only")
            .await;
        assert_eq!(extracted.entities.len(), 2);

        let request = &model.requests()[0];
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.response_format, Some(ResponseFormat::json_object()));
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert_eq!(
            request.messages[1].content.as_deref(),
            Some("Text: Ada met Babbage.\nInstructions: people only")
        );
    }

    #[tokio::test]
    async fn test_extraction_failures_are_empty() {
        let model = Arc::new(ScriptedModel::new().fail("boom").reply("not json"));
        let processor = EntityProcessor::new(model, None);

        assert!(processor.extract_entities_from_text("a", "").await.is_empty());
        assert!(processor.extract_entities_from_text("b", "").await.is_empty());
    }

    #[tokio::test]
    async fn test_store_without_graph_is_noop() {
        let processor = EntityProcessor::new(Arc::new(ScriptedModel::new()), None);
        processor.store_entities(&sample()).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_entities_writes_in_order() {
        let graph = Arc::new(RecordingGraph::new());
        let processor = EntityProcessor::new(Arc::new(ScriptedModel::new()), Some(graph.clone()));

        processor.store_entities(&sample()).await.unwrap();

        let statements = graph.statements();
        assert_eq!(statements.len(), 4);
        assert!(statements[..2].iter().all(|s| s.text.contains(":Entity {name: $name}")));
        assert!(statements[2].text.contains("[r:KNOWS]"));
        assert_eq!(statements[3].get_str("name"), Some("engines"));
    }

    #[tokio::test]
    async fn test_duplicate_names_are_merged_once() {
        let graph = Arc::new(RecordingGraph::new());
        let processor = EntityProcessor::new(Arc::new(ScriptedModel::new()), Some(graph.clone()));
        let extracted = parse_extraction(
            r#"{"entities": [{"entity_type": "x"}, {"entity_type": "y"}, {"name": "Ada"}]}"#,
        )
        .unwrap();

        processor.store_entities(&extracted).await.unwrap();

        let mut merged: Vec<(String, ParamValue)> = graph
            .statements()
            .iter()
            .map(|s| {
                (
                    s.get_str("name").unwrap_or_default().to_string(),
                    s.get("entity_type").cloned().unwrap(),
                )
            })
            .collect();
        merged.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(
            merged,
            vec![
                ("Ada".to_string(), ParamValue::from("unknown")),
                ("Unknown".to_string(), ParamValue::from("y")),
            ]
        );
    }

    #[tokio::test]
    async fn test_store_entities_propagates_errors() {
        let graph = Arc::new(RecordingGraph::failing_on(":Topic"));
        let processor = EntityProcessor::new(Arc::new(ScriptedModel::new()), Some(graph));

        assert!(processor.store_entities(&sample()).await.is_err());
    }

    #[tokio::test]
    async fn test_link_memory() {
        let graph = Arc::new(RecordingGraph::new());
        let processor = EntityProcessor::new(Arc::new(ScriptedModel::new()), Some(graph.clone()));

        processor.link_memory("m1", &sample()).await;

        let statements = graph.statements();
        assert_eq!(statements.len(), 3);
        assert!(statements.iter().all(|s| s.get_str("memory_id") == Some("m1")));
    }
}
