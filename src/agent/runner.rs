// ABOUTME: The agent loop - drives the model/tool conversation protocol.
// ABOUTME: Bounded rounds of chat calls with sequential, ordered tool dispatch.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::fallback;
use super::prompt::SYSTEM_PROMPT;
use crate::error::AgentError;
use crate::llm::{ChatMessage, ChatRequest, FunctionCall, LlmClient, ToolCall};
use crate::tool::Registry;

/// Allow enough rounds for write-test-fix cycles.
pub const DEFAULT_MAX_ROUNDS: usize = 20;

/// The conversational agent.
///
/// Each `chat` call is a fresh, self-contained conversation; the agent
/// itself is stateless across calls and can serve concurrent conversations
/// over the shared registry.
pub struct Agent {
    client: Arc<dyn LlmClient>,
    registry: Registry,
    model: String,
    max_rounds: usize,
}

impl Agent {
    /// Create a new agent over the given client and tool registry.
    pub fn new(client: Arc<dyn LlmClient>, registry: Registry) -> Self {
        Self {
            client,
            registry,
            model: String::new(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Set the model identifier sent with each request.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the maximum number of model/tool rounds per conversation.
    pub fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Run one conversation: send the user message, dispatch any tool calls
    /// the model requests, and return its final text.
    ///
    /// Only transport failures and the round bound surface as errors;
    /// unknown tools and failed executions are fed back to the model as
    /// tool results so it can self-correct.
    pub async fn chat(&self, user_message: &str) -> Result<String, AgentError> {
        let mut messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(user_message),
        ];

        for round in 1..=self.max_rounds {
            let request = ChatRequest::new(&self.model)
                .messages(messages.clone())
                .tools(self.registry.to_definitions().await);

            let response = self.client.chat(&request).await?;
            let assistant = response.message;

            let calls = if !assistant.tool_calls.is_empty() {
                assistant.tool_calls.clone()
            } else if let Some(inline) = fallback::parse_inline_call(&assistant.content) {
                info!(tool = %inline.name, round, "executing inline tool call");
                vec![ToolCall {
                    id: Uuid::new_v4().to_string(),
                    function: FunctionCall {
                        name: inline.name,
                        arguments: serde_json::Value::Object(inline.arguments),
                    },
                }]
            } else {
                // No tool calls on either path - this is the final answer.
                let content = fallback::sanitize_content(&assistant.content);
                return Ok(content.trim().to_string());
            };

            messages.push(assistant);

            for call in &calls {
                debug!(tool = %call.function.name, id = %call.id, round, "dispatching tool");
                let result = self.dispatch(call).await;
                messages.push(ChatMessage::tool_result(&call.id, result));
            }
        }

        Err(AgentError::MaxRounds(self.max_rounds))
    }

    /// Resolve and execute one tool call, reducing every outcome to the
    /// result text appended to the conversation.
    async fn dispatch(&self, call: &ToolCall) -> String {
        let name = &call.function.name;

        let Some(tool) = self.registry.get(name).await else {
            warn!(tool = %name, "unknown tool requested");
            return format!("Unknown tool: {name}");
        };

        match tool.execute(call.function.arguments.clone()).await {
            Ok(result) => result.content,
            Err(e) => {
                warn!(tool = %name, error = %e, "tool execution failed");
                format!("Error: {e:#}")
            }
        }
    }
}
