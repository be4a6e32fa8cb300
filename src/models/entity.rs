// file: src/models/entity.rs
// description: entities, relationships and topics extracted from text
// reference: internal data structures

use super::memory::Metadata;
use serde::{Deserialize, Serialize};

fn unknown_name() -> String {
    "Unknown".to_string()
}

fn unknown_type() -> String {
    "unknown".to_string()
}

fn full_confidence() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default = "unknown_name")]
    pub name: String,
    #[serde(default = "unknown_type")]
    pub entity_type: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Entity {
    pub fn new(name: &str, entity_type: &str) -> Self {
        Self {
            name: name.to_string(),
            entity_type: entity_type.to_string(),
            aliases: Vec::new(),
            description: None,
            metadata: Metadata::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default = "unknown_name")]
    pub source: String,
    #[serde(default = "unknown_name")]
    pub target: String,
    #[serde(default = "unknown_type")]
    pub relationship_type: String,
    #[serde(default)]
    pub description: Option<String>,
    /// 0.0 to 1.0
    #[serde(default = "full_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Relationship {
    pub fn new(source: &str, target: &str, relationship_type: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            relationship_type: relationship_type.to_string(),
            description: None,
            confidence: 1.0,
            metadata: Metadata::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty() && self.topics.is_empty()
    }

    pub fn entity_names(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.name.clone()).collect()
    }
}
