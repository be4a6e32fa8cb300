// file: src/llm/client.rs
// description: OpenAI chat completions client over reqwest
// reference: https://platform.openai.com/docs/api-reference/chat

use crate::config::OpenAiConfig;
use crate::error::{MindGardenError, Result};
use crate::llm::ChatModel;
use crate::llm::types::{ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    org_id: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MindGardenError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            org_id: config.org_id.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn describe_failure(status: StatusCode, body: &str) -> MindGardenError {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message)
            .unwrap_or_else(|| body.trim().to_string());

        let message = match status {
            StatusCode::UNAUTHORIZED => format!("authentication failed: {}", message),
            StatusCode::TOO_MANY_REQUESTS => format!("rate limit exceeded: {}", message),
            _ => message,
        };

        MindGardenError::LlmStatus {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn chat(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "sending chat completion request"
        );

        let mut builder = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request);

        if let Some(org_id) = &self.org_id {
            builder = builder.header("OpenAI-Organization", org_id);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| MindGardenError::Llm(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MindGardenError::Llm(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::describe_failure(status, &body));
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| MindGardenError::Llm(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &completion.usage {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion received"
            );
        }

        Ok(completion)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
