//! Chat-completions wire types.

use serde::{Deserialize, Serialize};

use crate::tools::ToolDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry of the conversation sent upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// Assistant turn that requested tool calls.
    pub fn assistant_tool_calls(content: String, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: (!content.is_empty()).then_some(content),
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments object.
    #[serde(default)]
    pub arguments: String,
}

/// `{"type": "function", "function": {...}}` entry of the `tools` array.
#[derive(Debug, Serialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: ToolDefinition,
}

impl ToolSpec {
    pub const fn function(definition: ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: definition,
        }
    }
}

/// POST body for `/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<&'a [ToolSpec]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<&'static str>,
}

/// Non-streaming response body.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseChoice {
    pub message: ChatMessage,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_empty_tools() {
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatCompletionRequest {
            model: "gpt-4.1",
            messages: &messages,
            stream: true,
            tools: None,
            tool_choice: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-4.1",
                "messages": [{ "role": "user", "content": "hi" }],
                "stream": true
            })
        );
    }

    #[test]
    fn tool_spec_wraps_definition() {
        let def = ToolDefinition {
            name: "calculate".into(),
            description: "math".into(),
            parameters: serde_json::json!({ "type": "object" }),
        };
        let json = serde_json::to_value(ToolSpec::function(def)).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "calculate");
    }

    #[test]
    fn tool_result_message_shape() {
        let json = serde_json::to_value(ChatMessage::tool_result("call_1", "4")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "role": "tool", "content": "4", "tool_call_id": "call_1" })
        );
    }

    #[test]
    fn parses_non_streaming_tool_calls() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null,
            "tool_calls":[{"id":"c1","type":"function","function":{"name":"calculate","arguments":"{\"expression\":\"1+1\"}"}}]}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let message = &response.choices[0].message;
        assert_eq!(message.content, None);
        assert_eq!(message.tool_calls[0].function.name, "calculate");
    }
}
