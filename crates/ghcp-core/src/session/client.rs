//! Collaborator traits consumed by the relay bridge.

use std::sync::Arc;

use async_trait::async_trait;

use super::types::{MessageOptions, SessionConfig, SessionEvent};
use crate::error::Result;

/// Callback invoked by a session for every event.
///
/// Implementations call it from their own dispatch task; it must return
/// promptly and must not panic.
pub type EventHandler = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Factory for chat sessions.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Create a new session configured with `config`.
    async fn create_session(&self, config: SessionConfig) -> Result<Box<dyn ChatSession>>;
}

/// One conversational exchange with the collaborator.
#[async_trait]
pub trait ChatSession: Send {
    /// Collaborator-assigned identifier.
    fn session_id(&self) -> &str;

    /// Register the event handler. A later call replaces the earlier one.
    fn on_event(&mut self, handler: EventHandler);

    /// Start a turn. Returns the message id once the turn is accepted;
    /// output arrives through the event handler.
    async fn send(&mut self, options: MessageOptions) -> Result<String>;

    /// Release the session and stop any in-flight turn.
    async fn destroy(&mut self) -> Result<()>;
}
