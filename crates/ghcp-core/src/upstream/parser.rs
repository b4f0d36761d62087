//! Streaming chat-completions parser.
//!
//! [`ChunkParser`] folds the `data:` payloads of SSE events into text deltas
//! and accumulated tool calls.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use super::types::{FunctionCall, ToolCall};
use crate::error::{Error, Result};

/// Result of feeding one `data:` payload.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedChunk {
    /// Non-empty content delta.
    pub text: Option<String>,
    /// `[DONE]` or a finish reason was seen.
    pub finished: bool,
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Output of one completed upstream round trip.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RoundOutput {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Accumulates one streamed completion.
#[derive(Debug, Default)]
pub struct ChunkParser {
    content: String,
    tool_calls: BTreeMap<u64, PartialToolCall>,
}

impl ChunkParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one `data:` payload.
    ///
    /// Unparsable JSON is skipped; an `error` object fails the stream.
    pub fn parse_data(&mut self, data: &str) -> Result<ParsedChunk> {
        if data.trim() == "[DONE]" {
            return Ok(ParsedChunk {
                text: None,
                finished: true,
            });
        }

        let json: Value = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, data, "Skipping unparsable stream chunk");
                return Ok(ParsedChunk::default());
            }
        };

        if let Some(error) = json.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| error.to_string(), str::to_string);
            return Err(Error::Stream(message));
        }

        let Some(choice) = json
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
        else {
            return Ok(ParsedChunk::default());
        };

        let finished = choice
            .get("finish_reason")
            .and_then(Value::as_str)
            .is_some_and(|reason| !reason.is_empty());

        let Some(delta) = choice.get("delta") else {
            return Ok(ParsedChunk {
                text: None,
                finished,
            });
        };

        let text = delta
            .get("content")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(|s| {
                self.content.push_str(s);
                s.to_string()
            });

        if let Some(calls) = delta.get("tool_calls").and_then(Value::as_array) {
            for call in calls {
                self.merge_tool_call(call);
            }
        }

        Ok(ParsedChunk { text, finished })
    }

    fn merge_tool_call(&mut self, call: &Value) {
        let index = call.get("index").and_then(Value::as_u64).unwrap_or(0);
        let partial = self.tool_calls.entry(index).or_default();
        if let Some(id) = call.get("id").and_then(Value::as_str) {
            partial.id = id.to_string();
        }
        if let Some(function) = call.get("function") {
            if let Some(name) = function.get("name").and_then(Value::as_str) {
                partial.name.push_str(name);
            }
            if let Some(args) = function.get("arguments").and_then(Value::as_str) {
                partial.arguments.push_str(args);
            }
        }
    }

    /// Finish the round: full text plus tool calls ordered by index.
    ///
    /// Calls without a name are dropped; calls without an id get one.
    pub fn finish(self) -> RoundOutput {
        let tool_calls = self
            .tool_calls
            .into_iter()
            .filter(|(_, partial)| !partial.name.is_empty())
            .map(|(index, partial)| ToolCall {
                id: if partial.id.is_empty() {
                    format!("call_{index}")
                } else {
                    partial.id
                },
                call_type: "function".to_string(),
                function: FunctionCall {
                    name: partial.name,
                    arguments: partial.arguments,
                },
            })
            .collect();
        RoundOutput {
            content: self.content,
            tool_calls,
        }
    }
}
