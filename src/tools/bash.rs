// ABOUTME: BashTool - executes shell commands in the shared workspace.
// ABOUTME: Returns stdout/stderr sections and handles non-zero exit codes.

use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::tool::{Tool, ToolResult};

const BASH_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_OUTPUT_BYTES: usize = 50_000;
const DEFAULT_WORKSPACE: &str = "workspace";

/// Tool for executing bash commands in the workspace directory.
pub struct BashTool {
    workspace_dir: String,
}

impl BashTool {
    /// Create a new bash tool running commands in the given workspace.
    pub fn new(workspace_dir: impl Into<String>) -> Self {
        let workspace_dir = workspace_dir.into();
        Self {
            workspace_dir: if workspace_dir.is_empty() {
                DEFAULT_WORKSPACE.to_string()
            } else {
                workspace_dir
            },
        }
    }
}

fn truncate_output(output: &str) -> String {
    if output.len() > MAX_OUTPUT_BYTES {
        let mut end = MAX_OUTPUT_BYTES;
        while !output.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}\n... (output truncated)", &output[..end])
    } else {
        output.to_string()
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Execute bash commands or scripts.

Use bash for:
- File operations (ls, cat, mv, cp, rm, find, grep)
- System info (df, du, ps, top, uname)
- Running CLI tools (curl, jq, git, docker)
- Quick one-liners and pipelines
- Directory navigation and file management

Use python instead for:
- Data analysis and processing
- Complex logic or algorithms
- Working with APIs that need parsing
- Anything requiring libraries (pandas, requests, etc.)

Commands run in the workspace directory. The workspace persists between runs."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The bash command or script to execute"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        #[derive(Deserialize)]
        struct Params {
            command: String,
        }
        let params: Params = serde_json::from_value(params)?;
        if params.command.is_empty() {
            anyhow::bail!("command is required");
        }

        tokio::fs::create_dir_all(&self.workspace_dir)
            .await
            .context("creating workspace")?;
        let workspace = std::path::Path::new(&self.workspace_dir)
            .canonicalize()
            .context("resolving workspace path")?;

        debug!(command = %params.command, "bash exec");

        let mut cmd = tokio::process::Command::new("bash");
        cmd.arg("-c")
            .arg(&params.command)
            .current_dir(&workspace)
            .env("WORKSPACE", &workspace)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(BASH_TIMEOUT, cmd.output()).await {
            Ok(output) => output.context("command failed")?,
            Err(_) => {
                return Ok(ToolResult::error(format!(
                    "Command timed out after {}s",
                    BASH_TIMEOUT.as_secs()
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut result = String::new();
        if !stdout.is_empty() {
            result.push_str(&truncate_output(&stdout));
        }
        if !stderr.is_empty() {
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str("STDERR:\n");
            result.push_str(&truncate_output(&stderr));
        }

        if !output.status.success() {
            if result.is_empty() {
                anyhow::bail!("command failed: {}", output.status);
            }
            result.push_str(&format!("\n\nExit code: {}", output.status.code().unwrap_or(-1)));
            return Ok(ToolResult::error(result));
        }

        if result.is_empty() {
            return Ok(ToolResult::text("(no output)"));
        }

        Ok(ToolResult::text(result.trim().to_string()))
    }
}
