// file: src/utils/validation.rs
// description: input validation and sanitizing helpers
// reference: input validation patterns

use crate::error::{MindGardenError, Result};
use crate::extractor::patterns::{LEADING_NON_LETTER, NON_IDENTIFIER};

const BOLT_SCHEMES: &[&str] = &[
    "bolt://",
    "bolt+s://",
    "bolt+ssc://",
    "neo4j://",
    "neo4j+s://",
    "neo4j+ssc://",
];

pub struct Validator;

impl Validator {
    pub fn validate_message_not_empty(message: &str) -> Result<()> {
        if message.trim().is_empty() {
            return Err(MindGardenError::Validation("Message is empty".to_string()));
        }
        Ok(())
    }

    pub fn validate_api_key(api_key: &str) -> Result<()> {
        if api_key.trim().is_empty() {
            return Err(MindGardenError::MissingApiKey);
        }
        Ok(())
    }

    pub fn validate_bolt_uri(uri: &str) -> Result<()> {
        if !BOLT_SCHEMES.iter().any(|scheme| uri.starts_with(scheme)) {
            return Err(MindGardenError::Validation(format!(
                "Unsupported Neo4j URI (expected bolt:// or neo4j:// scheme): {}",
                uri
            )));
        }

        let host = uri.split("://").nth(1).unwrap_or_default();
        if host.is_empty() {
            return Err(MindGardenError::Validation(format!(
                "Neo4j URI has no host: {}",
                uri
            )));
        }

        Ok(())
    }

    pub fn validate_temperature(temperature: f32) -> Result<()> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(MindGardenError::Validation(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                temperature
            )));
        }
        Ok(())
    }

    /// Turns free-form relationship labels ("works at") into a Cypher
    /// relationship type (`WORKS_AT`) that is safe to splice into a query.
    pub fn sanitize_relationship_type(relationship_type: &str) -> String {
        let upper = relationship_type.trim().to_uppercase();
        let replaced = NON_IDENTIFIER.replace_all(&upper, "_");
        let collapsed = replaced.trim_matches('_').to_string();

        if collapsed.is_empty() {
            return "RELATED_TO".to_string();
        }

        if LEADING_NON_LETTER.is_match(&collapsed) {
            format!("REL_{}", collapsed)
        } else {
            collapsed
        }
    }

    /// Truncates on a char boundary so multi-byte text never panics.
    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            text.to_string()
        } else {
            let truncated: String = text.chars().take(max_chars).collect();
            format!("{}...", truncated)
        }
    }
}
