//! Session event and configuration types.

use std::sync::Arc;

use crate::tools::ToolRegistry;

/// Notification pushed by a chat session while a turn is in progress.
///
/// Payload fields are optional because collaborators may omit them; a
/// missing field is treated as "no content" rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Partial assistant text.
    MessageDelta { delta_content: Option<String> },
    /// Final assistant text for the turn.
    Message { content: Option<String> },
    /// A tool invocation began.
    ToolExecutionStart { tool_name: Option<String> },
    /// A tool invocation finished.
    ToolExecutionComplete {
        tool_name: Option<String>,
        result: Option<String>,
    },
    /// The collaborator failed mid-turn.
    SessionError { message: String },
    /// No more work is pending for this turn.
    Idle,
    /// Event kind this crate does not know about.
    Unknown { event_type: String },
}

impl SessionEvent {
    /// Wire name of the event kind.
    pub fn event_type(&self) -> &str {
        match self {
            Self::MessageDelta { .. } => "assistant.message_delta",
            Self::Message { .. } => "assistant.message",
            Self::ToolExecutionStart { .. } => "tool.execution_start",
            Self::ToolExecutionComplete { .. } => "tool.execution_complete",
            Self::SessionError { .. } => "session.error",
            Self::Idle => "session.idle",
            Self::Unknown { event_type } => event_type,
        }
    }

    pub fn delta(text: impl Into<String>) -> Self {
        Self::MessageDelta {
            delta_content: Some(text.into()),
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self::Message {
            content: Some(text.into()),
        }
    }

    pub fn tool_start(name: impl Into<String>) -> Self {
        Self::ToolExecutionStart {
            tool_name: Some(name.into()),
        }
    }
}

/// System instruction attached to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemMessage {
    pub content: String,
}

impl SystemMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Options for creating a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Model identifier.
    pub model: String,
    /// Whether partial deltas should be emitted.
    pub streaming: bool,
    /// Optional system instruction.
    pub system_message: Option<SystemMessage>,
    /// Tools the model may call during the session.
    pub tools: Option<Arc<ToolRegistry>>,
}

impl SessionConfig {
    /// Streaming session for `model` with no system message or tools.
    pub fn streaming(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            streaming: true,
            system_message: None,
            tools: None,
        }
    }

    #[must_use]
    pub fn with_system_message(mut self, content: impl Into<String>) -> Self {
        self.system_message = Some(SystemMessage::new(content));
        self
    }

    #[must_use]
    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }
}

/// Payload of one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOptions {
    pub prompt: String,
}

impl MessageOptions {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}
