// file: src/llm/mod.rs
// description: language model abstraction and OpenAI client exports
// reference: internal module structure

pub mod client;
pub mod types;

use crate::error::Result;
use async_trait::async_trait;

pub use client::OpenAiClient;
pub use types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, FunctionCall,
    MessageRole, ResponseFormat, ToolCall, ToolDefinition,
};

/// Anything that can answer a chat completion request.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse>;

    fn model_name(&self) -> &str;
}
