// ABOUTME: TimeTool - returns the current date and time.

use async_trait::async_trait;
use chrono::Local;

use crate::tool::{Tool, ToolResult};

/// Tool that reports the current local date and time.
pub struct TimeTool;

#[async_trait]
impl Tool for TimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        let now = Local::now();
        Ok(ToolResult::text(
            now.format("%A, %B %-d, %Y at %-I:%M %p %Z").to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_formatted_time() {
        let tool = TimeTool;
        let result = tool.execute(serde_json::json!({})).await.unwrap();

        assert!(!result.is_error);
        // "Wednesday, August 6, 2025 at 3:04 PM ..." - check the stable parts.
        assert!(result.content.contains(" at "));
        assert!(result.content.contains("AM") || result.content.contains("PM"));
    }
}
