// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MindGardenError>;

#[derive(Error, Debug)]
pub enum MindGardenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("OPENAI_API_KEY is not set in the environment")]
    MissingApiKey,

    #[error("Database error: {0}")]
    Database(String),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("LLM API error (status {status}): {message}")]
    LlmStatus { status: u16, message: String },

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("File operation failed for {}: {source}", .path.display())]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MindGardenError {
    pub fn file_operation(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileOperation {
            path: path.into(),
            source,
        }
    }
}
