//! Outbound frames written to the SSE response.

use serde::{Deserialize, Serialize};

/// One outbound unit of a relay.
///
/// Serialized as `{"type": "<kind>", ...}`; each frame becomes one SSE
/// `data:` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Partial assistant text.
    Delta { content: String },
    /// Final assistant text.
    Done { content: String },
    /// A tool invocation started.
    ToolStart { tool: String },
    /// The collaborator reported a failure mid-turn.
    Error { message: String },
}

impl Frame {
    pub fn delta(content: impl Into<String>) -> Self {
        Self::Delta {
            content: content.into(),
        }
    }

    pub fn done(content: impl Into<String>) -> Self {
        Self::Done {
            content: content.into(),
        }
    }

    pub fn tool_start(tool: impl Into<String>) -> Self {
        Self::ToolStart { tool: tool.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Wire name of the frame kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Delta { .. } => "delta",
            Self::Done { .. } => "done",
            Self::ToolStart { .. } => "tool_start",
            Self::Error { .. } => "error",
        }
    }

    /// Delta frames without text are never emitted.
    pub(crate) const fn is_empty_delta(&self) -> bool {
        matches!(self, Self::Delta { content } if content.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        assert_eq!(
            serde_json::to_string(&Frame::delta("He")).unwrap(),
            r#"{"type":"delta","content":"He"}"#
        );
        assert_eq!(
            serde_json::to_string(&Frame::tool_start("calculate")).unwrap(),
            r#"{"type":"tool_start","tool":"calculate"}"#
        );
        assert_eq!(
            serde_json::to_string(&Frame::error("boom")).unwrap(),
            r#"{"type":"error","message":"boom"}"#
        );
    }

    #[test]
    fn parses_frames_sent_by_the_server() {
        let frame: Frame = serde_json::from_str(r#"{"type":"done","content":"Hello"}"#).unwrap();
        assert_eq!(frame, Frame::done("Hello"));
        assert_eq!(frame.kind(), "done");
    }

    #[test]
    fn only_textless_deltas_are_empty() {
        assert!(Frame::delta("").is_empty_delta());
        assert!(!Frame::delta(" ").is_empty_delta());
        assert!(!Frame::done("").is_empty_delta());
    }
}
