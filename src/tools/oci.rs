// ABOUTME: OciTool - operations on OCI container registries and images.
// ABOUTME: Shells out to skopeo, oras, and podman.

use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::tool::{Tool, ToolResult};

const OCI_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_OCI_OUTPUT: usize = 100_000;

/// Tool for interacting with container registries.
pub struct OciTool;

#[derive(Deserialize, Default)]
struct Params {
    #[serde(default)]
    operation: String,
    image: Option<String>,
    source: Option<String>,
    dest: Option<String>,
    annotations: Option<String>,
    file: Option<String>,
    media_type: Option<String>,
    #[serde(default)]
    raw: bool,
    #[serde(default)]
    all: bool,
}

impl Params {
    fn image(&self) -> anyhow::Result<String> {
        match self.image.as_deref().filter(|s| !s.is_empty()) {
            Some(image) => Ok(normalize_ref(image)),
            None => anyhow::bail!("image is required for {}", self.operation),
        }
    }
}

/// Ensure the image reference is fully qualified (docker.io default).
fn normalize_ref(reference: &str) -> String {
    let reference = reference
        .trim_start_matches("docker://")
        .trim_start_matches("oci://");

    match reference.split_once('/') {
        None => format!("docker.io/library/{reference}"),
        Some((first, _)) if !first.contains('.') => format!("docker.io/{reference}"),
        _ => reference.to_string(),
    }
}

/// Decode an annotations JSON object into `--annotation key=value` flags.
fn annotation_flags(annotations: &str) -> anyhow::Result<Vec<String>> {
    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(annotations).context("annotations must be a JSON object")?;

    let mut flags = Vec::with_capacity(map.len() * 2);
    for (key, value) in map {
        let value = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        flags.push("--annotation".to_string());
        flags.push(format!("{key}={value}"));
    }
    Ok(flags)
}

impl OciTool {
    async fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ToolResult> {
        self.run_with_input(program, args, None).await
    }

    async fn run_with_input(
        &self,
        program: &str,
        args: &[&str],
        input: Option<&str>,
    ) -> anyhow::Result<ToolResult> {
        debug!(program, ?args, "oci exec");

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let run = async {
            let mut child = cmd.spawn().with_context(|| format!("spawning {program}"))?;
            if let Some(input) = input {
                use tokio::io::AsyncWriteExt;
                let mut stdin = child.stdin.take().context("opening stdin")?;
                stdin.write_all(input.as_bytes()).await?;
                drop(stdin);
            }
            child.wait_with_output().await.context("waiting for command")
        };

        let output = match tokio::time::timeout(OCI_TIMEOUT, run).await {
            Ok(output) => output?,
            Err(_) => {
                return Ok(ToolResult::error(format!(
                    "{program} timed out after {}s",
                    OCI_TIMEOUT.as_secs()
                )));
            }
        };

        let mut stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if stdout.len() > MAX_OCI_OUTPUT {
            let mut end = MAX_OCI_OUTPUT;
            while !stdout.is_char_boundary(end) {
                end -= 1;
            }
            stdout = format!("{}\n... (truncated)", &stdout[..end]);
        }

        if !output.status.success() {
            warn!(program, status = %output.status, "oci command failed");
            if stderr.is_empty() {
                return Ok(ToolResult::error(format!("Error: {}", output.status)));
            }
            return Ok(ToolResult::error(format!(
                "Error: {}\n{stderr}",
                output.status
            )));
        }

        if !stdout.is_empty() {
            return Ok(ToolResult::text(stdout));
        }
        if !stderr.is_empty() {
            return Ok(ToolResult::text(stderr));
        }
        Ok(ToolResult::text("Command completed successfully"))
    }

    async fn inspect(&self, params: &Params) -> anyhow::Result<ToolResult> {
        let reference = params.image()?;
        self.run("skopeo", &["inspect", &format!("docker://{reference}")])
            .await
    }

    async fn manifest(&self, params: &Params) -> anyhow::Result<ToolResult> {
        let reference = params.image()?;
        let target = format!("docker://{reference}");

        let result = self.run("skopeo", &["inspect", "--raw", &target]).await?;
        if params.raw || result.is_error {
            return Ok(result);
        }

        // Pretty-print through jq when available.
        match self
            .run_with_input("jq", &["."], Some(&result.content))
            .await
        {
            Ok(formatted) if !formatted.is_error => Ok(formatted),
            _ => Ok(result),
        }
    }

    async fn list_tags(&self, params: &Params) -> anyhow::Result<ToolResult> {
        let mut reference = params.image()?;

        // Drop the tag if present; list-tags wants a bare repository.
        if let Some(colon) = reference.rfind(':') {
            if colon > reference.rfind('/').unwrap_or(0) {
                reference.truncate(colon);
            }
        }

        self.run("skopeo", &["list-tags", &format!("docker://{reference}")])
            .await
    }

    async fn pull(&self, params: &Params) -> anyhow::Result<ToolResult> {
        let reference = params.image()?;

        let mut args = vec!["pull"];
        if params.all {
            args.push("--all-tags");
        }
        args.push(&reference);

        self.run("podman", &args).await
    }

    async fn copy(&self, params: &Params) -> anyhow::Result<ToolResult> {
        let source = params.source.as_deref().unwrap_or_default();
        let dest = params.dest.as_deref().unwrap_or_default();
        if source.is_empty() || dest.is_empty() {
            anyhow::bail!("source and dest are required for copy");
        }

        let src = format!("docker://{}", normalize_ref(source));
        let dst = format!("docker://{}", normalize_ref(dest));

        let mut args = vec!["copy"];
        if params.all {
            args.push("--all");
        }
        args.push(&src);
        args.push(&dst);

        self.run("skopeo", &args).await
    }

    async fn annotate(&self, params: &Params) -> anyhow::Result<ToolResult> {
        let reference = params.image()?;
        let annotations = params.annotations.as_deref().unwrap_or_default();
        if annotations.is_empty() {
            anyhow::bail!("annotations JSON is required for annotate");
        }

        let mut args = vec![
            "manifest".to_string(),
            "annotate".to_string(),
            reference,
        ];
        args.extend(annotation_flags(annotations)?);

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run("oras", &args).await
    }

    async fn delete(&self, params: &Params) -> anyhow::Result<ToolResult> {
        let reference = params.image()?;
        self.run("skopeo", &["delete", &format!("docker://{reference}")])
            .await
    }

    async fn push(&self, params: &Params) -> anyhow::Result<ToolResult> {
        let file = params.file.as_deref().unwrap_or_default();
        let dest = params.dest.as_deref().unwrap_or_default();
        if file.is_empty() || dest.is_empty() {
            anyhow::bail!("file and dest are required for push");
        }

        let media_type = params
            .media_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("application/octet-stream");

        let mut args = vec![
            "push".to_string(),
            normalize_ref(dest),
            format!("{file}:{media_type}"),
        ];
        if let Some(annotations) = params.annotations.as_deref().filter(|s| !s.is_empty()) {
            args.extend(annotation_flags(annotations)?);
        }

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run("oras", &args).await
    }
}

#[async_trait]
impl Tool for OciTool {
    fn name(&self) -> &str {
        "oci"
    }

    fn description(&self) -> &str {
        "Interact with OCI container registries and images.

OPERATIONS:
- inspect: Examine image metadata and configuration
- manifest: Get raw image manifest (JSON)
- list-tags: List all tags in a repository
- pull: Pull/copy an image to local storage or another registry
- copy: Copy image between registries (with optional modifications)
- annotate: Add or modify annotations on an image
- delete: Delete an image tag from a registry
- push: Push a local artifact to a registry

EXAMPLES:
- Inspect image: operation=inspect, image=docker.io/library/alpine:latest
- Get manifest: operation=manifest, image=ghcr.io/org/app:v1.0
- List tags: operation=list-tags, image=docker.io/library/nginx
- Copy with annotations: operation=copy, source=src:tag, dest=dst:tag, annotations={\"key\": \"value\"}
- Pull image: operation=pull, image=quay.io/repo/image:tag

TOOLS USED:
- skopeo: For inspect, manifest, list-tags, copy, delete
- oras: For push artifacts, annotate
- podman: For local image operations when needed

All image references should be fully qualified (registry/repo:tag)."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "description": "The operation to perform",
                    "enum": ["inspect", "manifest", "list-tags", "pull", "copy", "annotate", "delete", "push"]
                },
                "image": {
                    "type": "string",
                    "description": "Image reference (registry/repo:tag) for inspect, manifest, list-tags, pull, delete"
                },
                "source": {
                    "type": "string",
                    "description": "Source image reference for copy operation"
                },
                "dest": {
                    "type": "string",
                    "description": "Destination image reference for copy/push operations"
                },
                "annotations": {
                    "type": "string",
                    "description": "JSON object of annotations to add (for annotate/copy operations)"
                },
                "file": {
                    "type": "string",
                    "description": "Local file path for push operation"
                },
                "media_type": {
                    "type": "string",
                    "description": "Media type for push operation (default: application/octet-stream)"
                },
                "raw": {
                    "type": "boolean",
                    "description": "For manifest: return raw JSON without formatting"
                },
                "all": {
                    "type": "boolean",
                    "description": "For pull/copy: copy all architectures (multi-arch)"
                }
            },
            "required": ["operation"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        let params: Params = serde_json::from_value(params)?;
        if params.operation.is_empty() {
            anyhow::bail!("operation is required");
        }

        info!(operation = %params.operation, "oci");

        match params.operation.as_str() {
            "inspect" => self.inspect(&params).await,
            "manifest" => self.manifest(&params).await,
            "list-tags" => self.list_tags(&params).await,
            "pull" => self.pull(&params).await,
            "copy" => self.copy(&params).await,
            "annotate" => self.annotate(&params).await,
            "delete" => self.delete(&params).await,
            "push" => self.push(&params).await,
            other => anyhow::bail!("unknown operation: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ref_bare_image() {
        assert_eq!(normalize_ref("alpine:latest"), "docker.io/library/alpine:latest");
    }

    #[test]
    fn test_normalize_ref_user_repo() {
        assert_eq!(normalize_ref("someuser/app:v1"), "docker.io/someuser/app:v1");
    }

    #[test]
    fn test_normalize_ref_qualified() {
        assert_eq!(
            normalize_ref("ghcr.io/org/app:v1"),
            "ghcr.io/org/app:v1"
        );
    }

    #[test]
    fn test_normalize_ref_strips_scheme() {
        assert_eq!(
            normalize_ref("docker://ghcr.io/org/app:v1"),
            "ghcr.io/org/app:v1"
        );
    }

    #[test]
    fn test_annotation_flags() {
        let flags = annotation_flags(r#"{"org.example.note": "a: b, c"}"#).unwrap();
        assert_eq!(flags, vec!["--annotation", "org.example.note=a: b, c"]);
    }

    #[test]
    fn test_annotation_flags_rejects_non_object() {
        assert!(annotation_flags("not json").is_err());
        assert!(annotation_flags("[1, 2]").is_err());
    }

    #[tokio::test]
    async fn test_missing_image_is_an_error() {
        let tool = OciTool;
        let err = tool
            .execute(serde_json::json!({"operation": "inspect"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("image is required"));
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let tool = OciTool;
        let err = tool
            .execute(serde_json::json!({"operation": "teleport"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown operation"));
    }
}
