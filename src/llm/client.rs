// ABOUTME: Defines the LlmClient trait - the abstraction layer that allows
// ABOUTME: the agent loop to work with any chat-completion backend.

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse};
use crate::error::LlmError;

/// Trait for LLM client implementations.
///
/// One call per conversation round; the loop never retries a failed call.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a conversation and tool bundle, receive one assistant message.
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse, LlmError>;
}
