//! Chat session model.
//!
//! The session and its event stream belong to an external collaborator;
//! this module only fixes the shape the relay bridge consumes.

mod client;
mod types;

pub use client::{ChatClient, ChatSession, EventHandler};
pub use types::*;
