// ABOUTME: LLM module - client abstraction for the chat-completion backend.
// ABOUTME: Defines wire types, the LlmClient trait, and the Ollama client.

mod client;
mod ollama;
mod types;

pub use client::*;
pub use ollama::*;
pub use types::*;

#[cfg(test)]
mod types_test;
