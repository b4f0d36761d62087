//! ghcp Core Library
//!
//! Shared functionality for the ghcp demo binaries:
//! - Session event model and the chat collaborator traits
//! - Streaming relay bridge (session events → SSE frames)
//! - OpenAI-compatible upstream client
//! - Demo tools for function calling
//! - Configuration resolution and tracing setup

pub mod config;
pub mod error;
pub mod relay;
pub mod session;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod tools;
pub mod tracing_init;
pub mod upstream;

pub use config::Config;
pub use error::{Error, Result};
pub use relay::{Frame, FrameStream, StandardClassifier};
pub use session::{ChatClient, ChatSession, MessageOptions, SessionConfig, SessionEvent};
