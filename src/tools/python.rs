// ABOUTME: PythonTool - a workspace for writing, running, and testing Python code.
// ABOUTME: Supports run/develop/test/write/read/list operations under one root.

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::tool::{Tool, ToolResult};

const PYTHON_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_OUTPUT_BYTES: usize = 50_000;
const MAX_TEST_OUTPUT: usize = 3_000;
const DEFAULT_WORKSPACE: &str = "workspace";

/// Tool providing a persistent Python workspace.
pub struct PythonTool {
    workspace_dir: String,
}

struct CommandOutput {
    text: String,
    success: bool,
    timed_out: bool,
}

impl PythonTool {
    /// Create a new Python workspace tool.
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

    /// Ensure the workspace directory exists.
    pub fn init(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.workspace_dir)
    }

    /// Resolve a model-supplied filename to a path inside the workspace.
    ///
    /// Parent-directory and root components are stripped so the payload
    /// cannot escape the workspace.
    fn safe_path(&self, filename: &str) -> PathBuf {
        let mut path = PathBuf::from(&self.workspace_dir);
        for component in Path::new(filename).components() {
            if let Component::Normal(part) = component {
                path.push(part);
            }
        }
        path
    }

    async fn run_command(&self, program: &str, args: &[&str]) -> anyhow::Result<CommandOutput> {
        debug!(program, ?args, "python workspace exec");

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args)
            .current_dir(&self.workspace_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(PYTHON_TIMEOUT, cmd.output()).await {
            Ok(output) => output.with_context(|| format!("running {program}"))?,
            Err(_) => {
                return Ok(CommandOutput {
                    text: String::new(),
                    success: false,
                    timed_out: true,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut text = String::new();
        if !stdout.is_empty() {
            text.push_str(&truncate(&stdout, MAX_OUTPUT_BYTES, "\n... (output truncated)"));
        }
        if !stderr.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str("STDERR:\n");
            text.push_str(&truncate(&stderr, MAX_OUTPUT_BYTES, "\n... (output truncated)"));
        }

        Ok(CommandOutput {
            text,
            success: output.status.success(),
            timed_out: false,
        })
    }

    async fn run_code(&self, args: &RunParams) -> anyhow::Result<ToolResult> {
        let mut temp = false;
        let script = if let Some(filename) = args.filename.as_deref().filter(|f| !f.is_empty()) {
            if !self.safe_path(filename).exists() {
                anyhow::bail!("file not found: {filename}");
            }
            filename.to_string()
        } else if let Some(code) = args.code.as_deref().filter(|c| !c.is_empty()) {
            // Inline code runs from a throwaway script in the workspace.
            let name = format!("run_{}.py", Uuid::new_v4().simple());
            tokio::fs::write(self.safe_path(&name), code)
                .await
                .context("writing code")?;
            temp = true;
            name
        } else {
            anyhow::bail!("either 'code' or 'filename' is required for run");
        };

        let result = self.run_command("python3", &[script.as_str()]).await;

        if temp {
            let _ = tokio::fs::remove_file(self.safe_path(&script)).await;
        }

        self.finish(result?)
    }

    async fn run_tests(&self, filename: Option<&str>) -> anyhow::Result<ToolResult> {
        let mut args = vec!["-v", "--tb=short", "--no-header"];
        if let Some(filename) = filename.filter(|f| !f.is_empty()) {
            if !self.safe_path(filename).exists() {
                anyhow::bail!("test file not found: {filename}");
            }
            args.push(filename);
        }

        let result = self.run_command("pytest", &args).await?;
        self.finish(result)
    }

    async fn develop(&self, args: DevelopParams) -> anyhow::Result<ToolResult> {
        let name = args.name.as_deref().unwrap_or_default();
        if name.is_empty() {
            anyhow::bail!("name is required for develop operation");
        }

        let impl_file = format!("{name}.py");
        let test_file = format!("test_{name}.py");

        // A retry supplies the fix in place of the original implementation.
        let implementation = args
            .fix_implementation
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(args.implementation.as_deref().filter(|s| !s.is_empty()));

        if let Some(code) = implementation {
            tokio::fs::write(self.safe_path(&impl_file), code)
                .await
                .context("writing implementation")?;
            info!(file = %impl_file, bytes = code.len(), "develop: wrote implementation");
        }
        if let Some(tests) = args.tests.as_deref().filter(|s| !s.is_empty()) {
            tokio::fs::write(self.safe_path(&test_file), tests)
                .await
                .context("writing tests")?;
            info!(file = %test_file, bytes = tests.len(), "develop: wrote tests");
        }

        if !self.safe_path(&impl_file).exists() {
            anyhow::bail!(
                "implementation file {impl_file} not found - provide 'implementation' parameter"
            );
        }
        if !self.safe_path(&test_file).exists() {
            anyhow::bail!("test file {test_file} not found - provide 'tests' parameter");
        }

        let run = self
            .run_command("pytest", &["-v", "--tb=short", test_file.as_str()])
            .await?;
        let output = truncate(&run.text, MAX_TEST_OUTPUT, "\n... (truncated)");
        let passed = run.success && !run.timed_out && !output.contains("FAILED");

        if passed && output.contains("passed") {
            info!(name, "develop: tests passed");
            return Ok(ToolResult::text(format!(
                "ALL TESTS PASSED\n\nFiles created:\n- {impl_file}\n- {test_file}\n\nTest output:\n{output}"
            )));
        }

        info!(name, "develop: tests failed");
        Ok(ToolResult::text(format!(
            r#"TESTS FAILED

Fix the implementation and call python again with:
- operation: "develop"
- name: "{name}"
- fix_implementation: <your fixed code>

Errors:
{output}

IMPORTANT: Only fix the implementation code. Keep the same tests.
Make minimal changes to fix the specific errors shown above."#
        )))
    }

    async fn write_file(&self, args: &RunParams) -> anyhow::Result<ToolResult> {
        let code = args.code.as_deref().unwrap_or_default();
        if code.is_empty() {
            anyhow::bail!("code is required for write operation");
        }
        let filename = args.filename.as_deref().unwrap_or_default();
        if filename.is_empty() {
            anyhow::bail!("filename is required for write operation");
        }

        let path = self.safe_path(filename);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("creating directory")?;
        }
        tokio::fs::write(&path, code).await.context("writing file")?;

        Ok(ToolResult::text(format!(
            "Saved to {filename} ({} bytes)",
            code.len()
        )))
    }

    async fn read_file(&self, args: &RunParams) -> anyhow::Result<ToolResult> {
        let filename = args.filename.as_deref().unwrap_or_default();
        if filename.is_empty() {
            anyhow::bail!("filename is required for read operation");
        }

        let path = self.safe_path(filename);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                anyhow::bail!("file not found: {filename}");
            }
            Err(e) => return Err(e).context("reading file"),
        };

        Ok(ToolResult::text(truncate(
            &content,
            MAX_OUTPUT_BYTES,
            "\n... (file truncated)",
        )))
    }

    async fn list_files(&self) -> anyhow::Result<ToolResult> {
        let pattern = format!("{}/**/*", self.workspace_dir);
        let root = Path::new(&self.workspace_dir);

        let mut files = Vec::new();
        for entry in glob::glob(&pattern).context("listing files")? {
            let path = entry.context("listing files")?;
            if path.is_file() {
                let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                let rel = path.strip_prefix(root).unwrap_or(&path);
                files.push(format!("  {} ({} bytes)", rel.display(), size));
            }
        }

        if files.is_empty() {
            return Ok(ToolResult::text("Workspace is empty."));
        }

        Ok(ToolResult::text(format!(
            "Files in workspace:\n{}",
            files.join("\n")
        )))
    }

    /// Convert a finished command into a result the model can act on.
    fn finish(&self, run: CommandOutput) -> anyhow::Result<ToolResult> {
        if run.timed_out {
            return Ok(ToolResult::text(format!(
                "{}\n\nExecution timed out after {}s",
                run.text,
                PYTHON_TIMEOUT.as_secs()
            )));
        }
        if !run.success {
            if run.text.is_empty() {
                anyhow::bail!("execution failed");
            }
            return Ok(ToolResult::error(run.text));
        }
        if run.text.is_empty() {
            return Ok(ToolResult::text("(no output)"));
        }
        Ok(ToolResult::text(run.text))
    }
}

#[derive(Deserialize, Default)]
struct RunParams {
    code: Option<String>,
    filename: Option<String>,
}

#[derive(Deserialize, Default)]
struct DevelopParams {
    name: Option<String>,
    implementation: Option<String>,
    tests: Option<String>,
    fix_implementation: Option<String>,
}

fn truncate(s: &str, max: usize, note: &str) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{note}", &s[..end])
}

#[async_trait]
impl Tool for PythonTool {
    fn name(&self) -> &str {
        "python"
    }

    fn description(&self) -> &str {
        "Python code execution and development.

OPERATIONS:
- run: Execute code (inline with 'code' param, or file with 'filename' param)
- develop: Create implementation + tests, runs tests automatically. Returns errors if tests fail.
- write: Save code to a file
- read: Read a file
- list: List workspace files
- test: Run pytest manually

FOR SIMPLE TASKS (quick results):
Use 'run' with inline code. Example: format data, calculate something.

FOR CODE WITH TESTS:
Use 'develop' - provide implementation and tests, tool runs tests automatically.
If tests fail, you get errors back. Call develop again with fixed code.

DEVELOP PARAMS:
- name: base filename (creates name.py and test_name.py)
- implementation: your Python code
- tests: pytest test code
- fix_implementation: fixed code when retrying after test failure"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "description": "The operation to perform",
                    "enum": ["run", "develop", "write", "read", "list", "test"]
                },
                "code": {
                    "type": "string",
                    "description": "Python code for 'run' (inline) or 'write' operations"
                },
                "filename": {
                    "type": "string",
                    "description": "Filename for write/read/run/test operations"
                },
                "name": {
                    "type": "string",
                    "description": "Base name for develop (creates name.py and test_name.py)"
                },
                "implementation": {
                    "type": "string",
                    "description": "Implementation code for develop operation"
                },
                "tests": {
                    "type": "string",
                    "description": "Test code for develop operation"
                },
                "fix_implementation": {
                    "type": "string",
                    "description": "Fixed implementation code when retrying after test failure"
                }
            },
            "required": ["operation"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        let operation = params["operation"].as_str().unwrap_or_default().to_string();
        if operation.is_empty() {
            anyhow::bail!("operation is required");
        }

        info!(operation = %operation, "python");

        self.init().context("creating workspace")?;

        match operation.as_str() {
            "run" => self.run_code(&serde_json::from_value(params)?).await,
            "develop" => self.develop(serde_json::from_value(params)?).await,
            "test" => {
                let args: RunParams = serde_json::from_value(params)?;
                self.run_tests(args.filename.as_deref()).await
            }
            "write" => self.write_file(&serde_json::from_value(params)?).await,
            "read" => self.read_file(&serde_json::from_value(params)?).await,
            "list" => self.list_files().await,
            _ => anyhow::bail!("unknown operation: {operation}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> (PythonTool, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let tool = PythonTool::new(dir.path().to_string_lossy().to_string());
        (tool, dir)
    }

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let (tool, _dir) = tool();

        let result = tool
            .execute(serde_json::json!({
                "operation": "write",
                "filename": "hello.py",
                "code": "print('hi')\n"
            }))
            .await
            .unwrap();
        assert!(result.content.contains("Saved to hello.py"));

        let result = tool
            .execute(serde_json::json!({
                "operation": "read",
                "filename": "hello.py"
            }))
            .await
            .unwrap();
        assert_eq!(result.content, "print('hi')\n");
    }

    #[tokio::test]
    async fn test_list_empty_workspace() {
        let (tool, _dir) = tool();
        let result = tool
            .execute(serde_json::json!({"operation": "list"}))
            .await
            .unwrap();
        assert_eq!(result.content, "Workspace is empty.");
    }

    #[tokio::test]
    async fn test_list_shows_written_files() {
        let (tool, _dir) = tool();
        tool.execute(serde_json::json!({
            "operation": "write",
            "filename": "a.py",
            "code": "pass"
        }))
        .await
        .unwrap();

        let result = tool
            .execute(serde_json::json!({"operation": "list"}))
            .await
            .unwrap();
        assert!(result.content.contains("a.py (4 bytes)"));
    }

    #[tokio::test]
    async fn test_path_traversal_is_confined() {
        let (tool, dir) = tool();
        tool.execute(serde_json::json!({
            "operation": "write",
            "filename": "../escape.py",
            "code": "pass"
        }))
        .await
        .unwrap();

        assert!(dir.path().join("escape.py").exists());
        assert!(!dir.path().parent().unwrap().join("escape.py").exists());
    }

    #[tokio::test]
    async fn test_run_missing_file() {
        let (tool, _dir) = tool();
        let err = tool
            .execute(serde_json::json!({
                "operation": "run",
                "filename": "nope.py"
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("file not found"));
    }

    #[tokio::test]
    async fn test_run_requires_code_or_filename() {
        let (tool, _dir) = tool();
        let err = tool
            .execute(serde_json::json!({"operation": "run"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'code' or 'filename'"));
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let (tool, _dir) = tool();
        let err = tool
            .execute(serde_json::json!({"operation": "compile"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown operation"));
    }

    #[tokio::test]
    async fn test_operation_is_required() {
        let (tool, _dir) = tool();
        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(err.to_string().contains("operation is required"));
    }

    #[test]
    fn test_truncate_notes_cut() {
        let long = "x".repeat(MAX_OUTPUT_BYTES + 10);
        let out = truncate(&long, MAX_OUTPUT_BYTES, "\n... (output truncated)");
        assert!(out.ends_with("... (output truncated)"));
        let short = truncate("short", MAX_OUTPUT_BYTES, "\n... (output truncated)");
        assert_eq!(short, "short");
    }
}
