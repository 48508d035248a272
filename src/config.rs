//! Configuration for the relay binary.
//!
//! All settings come from environment variables:
//! - `OLLAMA_URL` - Optional. Base URL of the Ollama server. Defaults to `http://localhost:11434`.
//! - `OLLAMA_MODEL` - Optional. Model identifier. Defaults to `qwen3-coder:30b`.
//! - `WORKSPACE_DIR` - Optional. Shared workspace for the python and bash tools. Defaults to `workspace`.
//! - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` - Optional. OAuth client for the calendar tool.
//! - `GOOGLE_REDIRECT_URL` - Optional. Defaults to the out-of-band redirect.
//! - `GOOGLE_TOKEN_FILE` - Optional. Where the OAuth token is persisted. Defaults to `google_token.json`.

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Ollama server.
    pub ollama_url: String,

    /// Model identifier for chat and summarization.
    pub ollama_model: String,

    /// Shared workspace directory for the python and bash tools.
    pub workspace_dir: String,

    /// Google OAuth client id (calendar tool).
    pub google_client_id: String,

    /// Google OAuth client secret (calendar tool).
    pub google_client_secret: String,

    /// OAuth redirect URL.
    pub google_redirect_url: String,

    /// Path where the OAuth token is persisted.
    pub google_token_file: String,
}

impl Config {
    /// Read configuration from environment variables with defaults.
    pub fn load() -> Self {
        Self {
            ollama_url: env_or("OLLAMA_URL", "http://localhost:11434"),
            ollama_model: env_or("OLLAMA_MODEL", "qwen3-coder:30b"),
            workspace_dir: env_or("WORKSPACE_DIR", "workspace"),
            google_client_id: std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: std::env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            google_redirect_url: env_or("GOOGLE_REDIRECT_URL", "urn:ietf:wg:oauth:2.0:oob"),
            google_token_file: env_or("GOOGLE_TOKEN_FILE", "google_token.json"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}
