// ABOUTME: Tests for LLM types - serialization, deserialization, helpers.
// ABOUTME: Verifies JSON format matches the Ollama chat API.

use super::*;

#[test]
fn test_role_serialization() {
    assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
    assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    assert_eq!(
        serde_json::to_string(&Role::Assistant).unwrap(),
        "\"assistant\""
    );
    assert_eq!(serde_json::to_string(&Role::Tool).unwrap(), "\"tool\"");
}

#[test]
fn test_role_deserialization() {
    assert_eq!(serde_json::from_str::<Role>("\"user\"").unwrap(), Role::User);
    assert_eq!(serde_json::from_str::<Role>("\"tool\"").unwrap(), Role::Tool);
}

#[test]
fn test_message_helpers() {
    let msg = ChatMessage::user("Hello");
    assert_eq!(msg.role, Role::User);
    assert_eq!(msg.content, "Hello");
    assert!(msg.tool_calls.is_empty());
    assert!(msg.tool_call_id.is_none());

    let msg = ChatMessage::system("Be helpful");
    assert_eq!(msg.role, Role::System);

    let msg = ChatMessage::assistant("Hi there");
    assert_eq!(msg.role, Role::Assistant);
}

#[test]
fn test_tool_result_carries_call_id() {
    let msg = ChatMessage::tool_result("call-7", "42");
    assert_eq!(msg.role, Role::Tool);
    assert_eq!(msg.content, "42");
    assert_eq!(msg.tool_call_id.as_deref(), Some("call-7"));
}

#[test]
fn test_message_serialization_skips_empty_fields() {
    let json = serde_json::to_value(ChatMessage::user("Hi")).unwrap();
    assert_eq!(json["role"], "user");
    assert_eq!(json["content"], "Hi");
    assert!(json.get("tool_calls").is_none());
    assert!(json.get("tool_call_id").is_none());
}

#[test]
fn test_tool_call_deserialization() {
    let json = r#"{
        "id": "123",
        "function": {
            "name": "bash",
            "arguments": {"command": "ls"}
        }
    }"#;
    let call: ToolCall = serde_json::from_str(json).unwrap();
    assert_eq!(call.id, "123");
    assert_eq!(call.function.name, "bash");
    assert_eq!(call.function.arguments["command"], "ls");
}

#[test]
fn test_tool_call_id_defaults_to_empty() {
    // Some Ollama models omit the id field entirely.
    let json = r#"{"function": {"name": "get_current_time", "arguments": {}}}"#;
    let call: ToolCall = serde_json::from_str(json).unwrap();
    assert_eq!(call.id, "");
    assert_eq!(call.function.name, "get_current_time");
}

#[test]
fn test_assistant_message_with_tool_calls_deserialization() {
    let json = r#"{
        "role": "assistant",
        "content": "",
        "tool_calls": [
            {"id": "a", "function": {"name": "bash", "arguments": {"command": "pwd"}}}
        ]
    }"#;
    let msg: ChatMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.role, Role::Assistant);
    assert_eq!(msg.tool_calls.len(), 1);
    assert_eq!(msg.tool_calls[0].function.name, "bash");
}

#[test]
fn test_request_builder() {
    let req = ChatRequest::new("qwen3-coder:30b")
        .message(ChatMessage::system("Be helpful"))
        .message(ChatMessage::user("Hi"))
        .tools(vec![ToolDefinition {
            name: "echo".into(),
            description: "Echoes input back".into(),
            parameters: serde_json::json!({"type": "object"}),
        }]);

    assert_eq!(req.model, "qwen3-coder:30b");
    assert_eq!(req.messages.len(), 2);
    assert_eq!(req.tools.len(), 1);
}

#[test]
fn test_response_has_tool_calls() {
    let response = ChatResponse {
        message: ChatMessage {
            role: Role::Assistant,
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "1".into(),
                function: FunctionCall {
                    name: "bash".into(),
                    arguments: serde_json::json!({"command": "ls"}),
                },
            }],
            tool_call_id: None,
        },
        model: "qwen3-coder:30b".into(),
    };
    assert!(response.has_tool_calls());

    let response = ChatResponse {
        message: ChatMessage::assistant("done"),
        model: "qwen3-coder:30b".into(),
    };
    assert!(!response.has_tool_calls());
}
