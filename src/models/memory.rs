// file: src/models/memory.rs
// description: memory records for the in-process store and the knowledge graph
// reference: internal data structures

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub type Metadata = Map<String, Value>;

const ITEM_FIELDS: &[&str] = &["text", "source", "date", "timestamp"];

/// Seconds since the epoch with microsecond precision.
pub fn unix_seconds(at: DateTime<Local>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

pub fn format_timestamp(timestamp: f64) -> String {
    let micros = (timestamp * 1_000_000.0).round() as i64;
    Local
        .timestamp_micros(micros)
        .single()
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// An entry in the in-process memory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    pub text: String,
    pub source: String,
    pub timestamp: f64,
    pub date: String,
    #[serde(flatten)]
    pub metadata: Metadata,
    #[serde(skip)]
    pub(crate) sequence: u64,
}

impl MemoryItem {
    pub fn new(text: &str, source: &str, timestamp: f64) -> Self {
        Self {
            text: text.to_string(),
            source: source.to_string(),
            timestamp,
            date: format_timestamp(timestamp),
            metadata: Metadata::new(),
            sequence: 0,
        }
    }

    /// Merges metadata into the item. Keys naming an item field overwrite
    /// that field; values of the wrong type for a field are dropped.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        for (key, value) in metadata {
            if !ITEM_FIELDS.contains(&key.as_str()) {
                self.metadata.insert(key, value);
                continue;
            }

            let applied = match key.as_str() {
                "text" => value.as_str().map(|v| self.text = v.to_string()),
                "source" => value.as_str().map(|v| self.source = v.to_string()),
                "date" => value.as_str().map(|v| self.date = v.to_string()),
                _ => value.as_f64().map(|v| self.timestamp = v),
            };

            if applied.is_none() {
                warn!("Dropping metadata key '{}' with unexpected value {}", key, value);
            }
        }
        self
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn display_line(&self) -> String {
        format!("{} [From: {}]", self.text, self.source)
    }
}

/// A `:Memory` node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub content: String,
    pub source: String,
    pub timestamp: f64,
    pub date_str: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Memory {
    pub fn display_line(&self) -> String {
        format!("{} [From: {}]", self.content, self.source)
    }
}

/// Graph-side representation; Neo4j properties cannot hold maps, so
/// metadata travels as a JSON string.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryNode {
    pub id: String,
    pub content: String,
    pub source: String,
    pub timestamp: f64,
    pub date_str: String,
    #[serde(default)]
    pub metadata_json: Option<String>,
}

impl From<MemoryNode> for Memory {
    fn from(node: MemoryNode) -> Self {
        let metadata = node
            .metadata_json
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Metadata>(raw).ok())
            .unwrap_or_default();

        Self {
            id: node.id,
            content: node.content,
            source: node.source,
            timestamp: node.timestamp,
            date_str: node.date_str,
            metadata,
        }
    }
}
