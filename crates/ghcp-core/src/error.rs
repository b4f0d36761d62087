//! Error types for the ghcp core library.

use thiserror::Error;

/// Result type alias using the core [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for ghcp operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream API returned a non-success status
    #[error("Upstream API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Transport failure talking to the upstream API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed or failed upstream stream
    #[error("Upstream stream error: {0}")]
    Stream(String),

    /// A turn is already running on the session
    #[error("Turn already in progress on session {session_id}")]
    TurnInProgress { session_id: String },

    /// Operation on a session that was already destroyed
    #[error("Session closed: {session_id}")]
    SessionClosed { session_id: String },

    /// Session creation rejected by the collaborator
    #[error("Failed to create session: {0}")]
    SessionCreate(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
