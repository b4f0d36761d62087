//! Mapping from session events to frames.

use tracing::trace;

use super::frame::Frame;
use crate::session::SessionEvent;

/// Outcome of classifying one event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    /// Frame to enqueue, if any.
    pub frame: Option<Frame>,
    /// Whether the relay ends after this event.
    pub terminate: bool,
}

impl Classification {
    pub const fn ignore() -> Self {
        Self {
            frame: None,
            terminate: false,
        }
    }

    pub const fn emit(frame: Frame) -> Self {
        Self {
            frame: Some(frame),
            terminate: false,
        }
    }

    pub const fn terminate() -> Self {
        Self {
            frame: None,
            terminate: true,
        }
    }

    pub const fn emit_and_terminate(frame: Frame) -> Self {
        Self {
            frame: Some(frame),
            terminate: true,
        }
    }
}

/// Decides which frame, if any, an event produces.
///
/// Called from the collaborator's dispatch context, so it must not block.
pub trait EventClassifier: Send + Sync + 'static {
    fn classify(&self, event: &SessionEvent) -> Classification;
}

impl<F> EventClassifier for F
where
    F: Fn(&SessionEvent) -> Classification + Send + Sync + 'static,
{
    fn classify(&self, event: &SessionEvent) -> Classification {
        self(event)
    }
}

/// Classifier shared by the chat, codegen and tools endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StandardClassifier {
    /// Forward `tool.execution_start` as `tool_start` frames.
    pub forward_tool_starts: bool,
}

impl StandardClassifier {
    /// Deltas, final message and idle only.
    pub const fn chat() -> Self {
        Self {
            forward_tool_starts: false,
        }
    }

    /// Same as [`chat`](Self::chat) plus tool-start notifications.
    pub const fn with_tools() -> Self {
        Self {
            forward_tool_starts: true,
        }
    }
}

impl EventClassifier for StandardClassifier {
    fn classify(&self, event: &SessionEvent) -> Classification {
        match event {
            SessionEvent::MessageDelta { delta_content } => match delta_content.as_deref() {
                Some(text) if !text.is_empty() => Classification::emit(Frame::delta(text)),
                _ => Classification::ignore(),
            },
            SessionEvent::Message { content } => {
                Classification::emit(Frame::done(content.clone().unwrap_or_default()))
            }
            SessionEvent::ToolExecutionStart { tool_name } if self.forward_tool_starts => {
                let tool = tool_name.as_deref().unwrap_or("unknown");
                Classification::emit(Frame::tool_start(tool))
            }
            SessionEvent::SessionError { message } => {
                Classification::emit_and_terminate(Frame::error(message.clone()))
            }
            SessionEvent::Idle => Classification::terminate(),
            SessionEvent::ToolExecutionStart { .. }
            | SessionEvent::ToolExecutionComplete { .. }
            | SessionEvent::Unknown { .. } => {
                trace!(event_type = event.event_type(), "Ignoring session event");
                Classification::ignore()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_maps_deltas_and_final_message() {
        let c = StandardClassifier::chat();
        assert_eq!(
            c.classify(&SessionEvent::delta("He")),
            Classification::emit(Frame::delta("He"))
        );
        assert_eq!(
            c.classify(&SessionEvent::message("Hello")),
            Classification::emit(Frame::done("Hello"))
        );
        assert_eq!(c.classify(&SessionEvent::Idle), Classification::terminate());
    }

    #[test]
    fn missing_payloads_mean_no_content() {
        let c = StandardClassifier::chat();
        assert_eq!(
            c.classify(&SessionEvent::MessageDelta {
                delta_content: None
            }),
            Classification::ignore()
        );
        assert_eq!(
            c.classify(&SessionEvent::delta("")),
            Classification::ignore()
        );
        assert_eq!(
            c.classify(&SessionEvent::Message { content: None }),
            Classification::emit(Frame::done(""))
        );
    }

    #[test]
    fn tool_starts_only_forwarded_when_enabled() {
        let event = SessionEvent::tool_start("calculate");
        assert_eq!(
            StandardClassifier::chat().classify(&event),
            Classification::ignore()
        );
        assert_eq!(
            StandardClassifier::with_tools().classify(&event),
            Classification::emit(Frame::tool_start("calculate"))
        );
        assert_eq!(
            StandardClassifier::with_tools()
                .classify(&SessionEvent::ToolExecutionStart { tool_name: None }),
            Classification::emit(Frame::tool_start("unknown"))
        );
    }

    #[test]
    fn session_error_emits_error_and_terminates() {
        let c = StandardClassifier::chat();
        assert_eq!(
            c.classify(&SessionEvent::SessionError {
                message: "upstream down".into()
            }),
            Classification::emit_and_terminate(Frame::error("upstream down"))
        );
    }

    #[test]
    fn unknown_and_completion_events_are_ignored() {
        let c = StandardClassifier::with_tools();
        assert_eq!(
            c.classify(&SessionEvent::Unknown {
                event_type: "session.usage".into()
            }),
            Classification::ignore()
        );
        assert_eq!(
            c.classify(&SessionEvent::ToolExecutionComplete {
                tool_name: Some("calculate".into()),
                result: Some("4".into())
            }),
            Classification::ignore()
        );
    }

    #[test]
    fn closures_are_classifiers() {
        let only_idle = |event: &SessionEvent| {
            if matches!(event, SessionEvent::Idle) {
                Classification::terminate()
            } else {
                Classification::ignore()
            }
        };
        assert!(only_idle.classify(&SessionEvent::Idle).terminate);
        assert!(!only_idle.classify(&SessionEvent::message("x")).terminate);
    }
}
