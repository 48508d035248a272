// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use relay::prelude::*;` to get started quickly.

pub use crate::agent::{Agent, DEFAULT_MAX_ROUNDS, SYSTEM_PROMPT};
pub use crate::config::Config;
pub use crate::error::{AgentError, LlmError, RelayError, ToolError};
pub use crate::llm::{
    ChatMessage, ChatRequest, ChatResponse, FunctionCall, LlmClient, OllamaClient, Role, ToolCall,
    ToolDefinition,
};
pub use crate::tool::{Registry, Tool, ToolResult};
pub use crate::tools::{BashTool, CalendarTool, OciTool, PythonTool, ScrapeTool, TimeTool};
