// ABOUTME: Agent module - the conversation loop connecting the LLM to tools.
// ABOUTME: Provides the Agent runner, system prompt, and inline-call fallback.

mod fallback;
mod prompt;
mod runner;

pub use prompt::SYSTEM_PROMPT;
pub use runner::{Agent, DEFAULT_MAX_ROUNDS};
