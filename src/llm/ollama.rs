// ABOUTME: Ollama API client speaking the native /api/chat endpoint.
// ABOUTME: Connects to a local Ollama server with tool-calling enabled.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::LlmClient;
use super::{ChatMessage, ChatRequest, ChatResponse, ToolDefinition};
use crate::error::LlmError;
use async_trait::async_trait;

/// Base URL for a local Ollama server.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Default model when none is specified.
pub const OLLAMA_DEFAULT_MODEL: &str = "qwen3-coder:30b";

/// Model responses can be slow, especially on first load.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

/// Client for the Ollama chat API.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    http: reqwest::Client,
    default_model: String,
}

impl OllamaClient {
    /// Create a new Ollama client connecting to localhost:11434.
    pub fn new(model: &str) -> Self {
        Self::with_base_url(OLLAMA_BASE_URL, model)
    }

    /// Create a new Ollama client with a custom base URL.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the Ollama server (e.g., "http://remote-server:11434")
    /// * `model` - The default model to use (e.g., "qwen3-coder:30b", "llama3.2")
    pub fn with_base_url(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            default_model: if model.is_empty() {
                OLLAMA_DEFAULT_MODEL.to_string()
            } else {
                model.to_string()
            },
        }
    }

    /// The model used when a request does not name one.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// One-shot completion via the generate endpoint.
    ///
    /// Used for side tasks like page summarization that don't need the
    /// conversation machinery.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = ApiGenerateRequest {
            model: &self.default_model,
            prompt,
            stream: false,
        };

        let url = format!("{}/api/generate", self.base_url);
        let response = self.http.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ApiGenerateResponse = response.json().await?;
        Ok(parsed.response.trim().to_string())
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(OLLAMA_DEFAULT_MODEL)
    }
}

/// Native chat request body.
#[derive(Serialize)]
struct ApiChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ApiTool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ApiFunction<'a>,
}

#[derive(Serialize)]
struct ApiFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

impl<'a> From<&'a ToolDefinition> for ApiTool<'a> {
    fn from(def: &'a ToolDefinition) -> Self {
        ApiTool {
            tool_type: "function",
            function: ApiFunction {
                name: &def.name,
                description: &def.description,
                parameters: &def.parameters,
            },
        }
    }
}

#[derive(Deserialize)]
struct ApiChatResponse {
    #[serde(default)]
    model: String,
    message: ChatMessage,
}

#[derive(Serialize)]
struct ApiGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct ApiGenerateResponse {
    #[serde(default)]
    response: String,
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let model = if req.model.is_empty() {
            &self.default_model
        } else {
            &req.model
        };

        let body = ApiChatRequest {
            model,
            messages: &req.messages,
            tools: req.tools.iter().map(ApiTool::from).collect(),
            stream: false,
        };

        let url = format!("{}/api/chat", self.base_url);
        let response = self.http.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ApiChatResponse = response.json().await?;

        debug!(
            model = %parsed.model,
            content_len = parsed.message.content.len(),
            tool_calls = parsed.message.tool_calls.len(),
            "chat response"
        );

        Ok(ChatResponse {
            message: parsed.message,
            model: parsed.model,
        })
    }
}

#[cfg(test)]
mod ollama_test {
    use super::*;

    #[test]
    fn test_client_new() {
        let client = OllamaClient::new("qwen3-coder:30b");
        assert_eq!(client.base_url, OLLAMA_BASE_URL);
        assert_eq!(client.default_model, "qwen3-coder:30b");
    }

    #[test]
    fn test_client_new_empty_model() {
        let client = OllamaClient::new("");
        assert_eq!(client.default_model, OLLAMA_DEFAULT_MODEL);
    }

    #[test]
    fn test_client_with_base_url() {
        let client = OllamaClient::with_base_url("http://remote:11434/", "llama3.2");
        assert_eq!(client.base_url, "http://remote:11434");
        assert_eq!(client.default_model, "llama3.2");
    }

    #[test]
    fn test_tool_definition_wire_format() {
        let def = ToolDefinition {
            name: "echo".into(),
            description: "Echoes input back".into(),
            parameters: serde_json::json!({"type": "object"}),
        };
        let tool = ApiTool::from(&def);
        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["type"], "function");
        assert_eq!(value["function"]["name"], "echo");
        assert_eq!(value["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_chat_request_skips_empty_tools() {
        let body = ApiChatRequest {
            model: "m",
            messages: &[],
            tools: Vec::new(),
            stream: false,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("tools").is_none());
        assert_eq!(value["stream"], false);
    }
}
