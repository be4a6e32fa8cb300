// file: src/agent/assistant.rs
// description: the conversational agent, one user message in and one reply out
// reference: https://platform.openai.com/docs/guides/function-calling

use crate::agent::prompt::build_system_prompt;
use crate::agent::tools::{self, memory_search_tool};
use crate::config::{AgentConfig, Config};
use crate::error::{MindGardenError, Result};
use crate::llm::{ChatCompletionRequest, ChatMessage, ChatModel};
use crate::memory::MemoryStore;
use crate::models::{AgentState, ConversationTurn, Role};
use crate::utils::{OperationTimer, Validator};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

const SLOW_TURN: Duration = Duration::from_secs(30);

pub struct Agent {
    config: AgentConfig,
    retrieval_limit: usize,
    model: Arc<dyn ChatModel>,
    memory: Box<dyn MemoryStore>,
    conversation_history: Vec<ConversationTurn>,
    state: AgentState,
}

impl Agent {
    pub fn new(config: &Config, model: Arc<dyn ChatModel>, memory: Box<dyn MemoryStore>) -> Self {
        info!(
            "Initialized agent {} with model {}",
            config.agent.name,
            model.model_name()
        );
        Self {
            config: config.agent.clone(),
            retrieval_limit: config.memory.retrieval_limit,
            model,
            memory,
            conversation_history: Vec::new(),
            state: AgentState::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn conversation_history(&self) -> &[ConversationTurn] {
        &self.conversation_history
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn memory(&self) -> &dyn MemoryStore {
        self.memory.as_ref()
    }

    pub fn reset(&mut self) {
        self.conversation_history.clear();
        self.state = AgentState::default();
        debug!("Conversation reset");
    }

    /// Answers one user message. When the model or the memory store fails,
    /// the user turn is withdrawn from the history and the error returned.
    pub async fn process_message(&mut self, message: &str) -> Result<String> {
        Validator::validate_message_not_empty(message)?;
        let timer = OperationTimer::start("agent turn");

        self.conversation_history.push(ConversationTurn::user(message));

        let reply = match self.answer(message).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Error running agent: {}", e);
                self.conversation_history.pop();
                return Err(e);
            }
        };

        if let Err(e) = self.memory.store_conversation(message, &reply).await {
            error!("Error storing conversation: {}", e);
            self.conversation_history.pop();
            return Err(e);
        }

        self.conversation_history
            .push(ConversationTurn::assistant(&reply));

        timer.warn_if_slow(SLOW_TURN);
        timer.finish();
        Ok(reply)
    }

    async fn answer(&mut self, message: &str) -> Result<String> {
        let relevant_memories = self
            .memory
            .retrieve_relevant(message, self.retrieval_limit)
            .await?;

        let window_start = self
            .conversation_history
            .len()
            .saturating_sub(self.config.history_window);
        self.state = AgentState {
            conversation: self.conversation_history[window_start..].to_vec(),
            relevant_memories,
        };

        let mut messages = vec![ChatMessage::system(&build_system_prompt(
            &self.config.name,
            &self.state.relevant_memories,
        ))];
        messages.extend(self.state.conversation.iter().map(|turn| match turn.role {
            Role::User => ChatMessage::user(&turn.content),
            Role::Assistant => ChatMessage::assistant(&turn.content),
        }));

        self.run_tool_loop(messages).await
    }

    fn request(&self, messages: Vec<ChatMessage>) -> ChatCompletionRequest {
        let mut request = ChatCompletionRequest::new(self.model.model_name(), messages);
        request.temperature = Some(self.config.temperature);
        request.max_tokens = self.config.max_tokens;
        request.tools = Some(vec![memory_search_tool()]);
        request
    }

    async fn run_tool_loop(&self, mut messages: Vec<ChatMessage>) -> Result<String> {
        let mut rounds = 0;

        loop {
            let response = self.model.chat(self.request(messages.clone())).await?;
            let reply = response
                .first_message()
                .cloned()
                .ok_or_else(|| MindGardenError::Agent("model returned no choices".to_string()))?;

            if reply.requested_tools().is_empty() {
                return Ok(reply.content.unwrap_or_default());
            }

            if rounds == self.config.max_tool_rounds {
                return Err(MindGardenError::Agent(format!(
                    "model kept requesting tools after {} rounds",
                    rounds
                )));
            }
            rounds += 1;

            let calls = reply.requested_tools().to_vec();
            messages.push(reply);
            for call in &calls {
                let result = tools::dispatch(self.memory.as_ref(), call).await;
                messages.push(ChatMessage::tool_result(&call.id, &result.to_string()));
            }
            debug!("Completed tool round {} ({} calls)", rounds, calls.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testing::RecordingGraph;
    use crate::llm::testing::ScriptedModel;
    use crate::llm::{MessageRole, ToolCall};
    use crate::memory::{GraphMemoryStore, MemoryManager};
    use crate::models::Metadata;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    /// Remembers every query it was asked and returns nothing.
    #[derive(Default)]
    struct QueryLog {
        queries: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl MemoryStore for QueryLog {
        async fn retrieve_relevant(&self, query: &str, _limit: usize) -> Result<Vec<String>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(Vec::new())
        }

        async fn store_conversation(&mut self, _user: &str, _assistant: &str) -> Result<()> {
            Ok(())
        }

        async fn store_document(
            &mut self,
            _content: &str,
            _source: &str,
            _metadata: Option<Metadata>,
        ) -> Result<()> {
            Ok(())
        }

        async fn clear(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn agent_with(model: Arc<ScriptedModel>, memory: MemoryManager) -> Agent {
        Agent::new(&Config::default_config(), model, Box::new(memory))
    }

    fn search_call(id: &str) -> ToolCall {
        ToolCall::function(id, "memory_search", r#"{"query": "garden"}"#)
    }

    #[test]
    fn test_initial_state() {
        let agent = agent_with(Arc::new(ScriptedModel::new()), MemoryManager::new());

        assert_eq!(agent.name(), "Quinn");
        assert!(agent.conversation_history().is_empty());
        assert_eq!(agent.state(), &AgentState::default());
    }

    #[tokio::test]
    async fn test_process_message() {
        let model = Arc::new(ScriptedModel::new().reply("This is a test response"));
        let mut agent = agent_with(model.clone(), MemoryManager::new());

        let reply = agent.process_message("Hello, Quinn!").await.unwrap();

        assert_eq!(reply, "This is a test response");
        assert_eq!(
            agent.conversation_history(),
            &[
                ConversationTurn::user("Hello, Quinn!"),
                ConversationTurn::assistant("This is a test response"),
            ]
        );

        let stored = agent.memory().retrieve_relevant("", 10).await.unwrap();
        assert_eq!(
            stored,
            vec![
                "This is a test response [From: assistant]".to_string(),
                "Hello, Quinn! [From: user]".to_string(),
            ]
        );

        let request = &model.requests()[0];
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.tools.as_ref().map(Vec::len), Some(1));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].content.as_deref(), Some("Hello, Quinn!"));
    }

    #[tokio::test]
    async fn test_memories_reach_system_prompt() {
        let mut memory = MemoryManager::new();
        memory
            .store_document("Tomatoes went in on Sunday", "journal", None)
            .await
            .unwrap();
        let model = Arc::new(ScriptedModel::new().reply("Noted."));
        let mut agent = agent_with(model.clone(), memory);

        agent.process_message("When did I plant?").await.unwrap();

        assert_eq!(
            agent.state().relevant_memories,
            vec!["Tomatoes went in on Sunday [From: journal]".to_string()]
        );
        let system = model.requests()[0].messages[0].content.clone().unwrap();
        assert!(system.contains("1. Tomatoes went in on Sunday [From: journal]"));
    }

    #[tokio::test]
    async fn test_tool_calls_are_answered() {
        let model = Arc::new(
            ScriptedModel::new()
                .call_tools(vec![search_call("call_1")])
                .reply("Found it."),
        );
        let mut agent = agent_with(model.clone(), MemoryManager::new());

        let reply = agent.process_message("What do you remember?").await.unwrap();
        assert_eq!(reply, "Found it.");

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        let tool_message = requests[1].messages.last().unwrap();
        assert_eq!(tool_message.role, MessageRole::Tool);
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));

        let payload: Value = serde_json::from_str(tool_message.content.as_deref().unwrap()).unwrap();
        assert_eq!(payload["count"], Value::from(0));
    }

    #[tokio::test]
    async fn test_tool_round_cap() {
        let mut config = Config::default_config();
        config.agent.max_tool_rounds = 1;
        let model = Arc::new(
            ScriptedModel::new()
                .call_tools(vec![search_call("a")])
                .call_tools(vec![search_call("b")]),
        );
        let mut agent = Agent::new(&config, model.clone(), Box::new(MemoryManager::new()));

        let result = agent.process_message("loop forever").await;

        assert!(matches!(result, Err(MindGardenError::Agent(_))));
        assert_eq!(model.requests().len(), 2);
        assert!(agent.conversation_history().is_empty());
    }

    #[tokio::test]
    async fn test_conversation_window() {
        let mut config = Config::default_config();
        config.agent.history_window = 3;
        let model = Arc::new(
            ScriptedModel::new()
                .reply("one")
                .reply("two")
                .reply("three"),
        );
        let mut agent = Agent::new(&config, model.clone(), Box::new(MemoryManager::new()));

        for message in ["a", "b", "c"] {
            agent.process_message(message).await.unwrap();
        }

        assert_eq!(agent.conversation_history().len(), 6);
        assert_eq!(
            agent.state().conversation,
            vec![
                ConversationTurn::user("b"),
                ConversationTurn::assistant("two"),
                ConversationTurn::user("c"),
            ]
        );
        // system prompt plus the three-turn window
        assert_eq!(model.requests()[2].messages.len(), 4);
    }

    #[tokio::test]
    async fn test_rejects_empty_messages() {
        let model = Arc::new(ScriptedModel::new());
        let mut agent = agent_with(model.clone(), MemoryManager::new());

        assert!(matches!(
            agent.process_message("   ").await,
            Err(MindGardenError::Validation(_))
        ));
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn test_model_errors_propagate() {
        let model = Arc::new(ScriptedModel::new().fail("upstream down"));
        let mut agent = agent_with(model, MemoryManager::new());

        assert!(matches!(
            agent.process_message("hi").await,
            Err(MindGardenError::Llm(_))
        ));
        assert!(agent.memory().retrieve_relevant("", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_is_queried_with_user_message() {
        let log = QueryLog::default();
        let queries = log.queries.clone();
        let model = Arc::new(ScriptedModel::new().reply("Sure."));
        let mut agent = Agent::new(&Config::default_config(), model, Box::new(log));

        agent.process_message("Where did I put the trowel?").await.unwrap();

        assert_eq!(
            *queries.lock().unwrap(),
            vec!["Where did I put the trowel?".to_string()]
        );
    }

    #[tokio::test]
    async fn test_storage_failure_leaves_history_untouched() {
        let graph = Arc::new(RecordingGraph::failing_on("CREATE"));
        let model = Arc::new(ScriptedModel::new().reply("hi there"));
        let mut agent = Agent::new(
            &Config::default_config(),
            model,
            Box::new(GraphMemoryStore::new(graph)),
        );

        let result = agent.process_message("hello").await;

        assert!(matches!(result, Err(MindGardenError::Database(_))));
        assert!(agent.conversation_history().is_empty());
    }

    #[tokio::test]
    async fn test_reset() {
        let model = Arc::new(ScriptedModel::new().reply("hi"));
        let mut agent = agent_with(model, MemoryManager::new());
        agent.process_message("hello").await.unwrap();

        agent.reset();

        assert!(agent.conversation_history().is_empty());
        assert_eq!(agent.state(), &AgentState::default());
    }
}
