//! OpenAI-compatible upstream collaborator.

mod client;
mod parser;
mod types;

pub use client::{HttpChatClient, HttpSession, MAX_TOOL_ROUNDS};
pub use parser::{ChunkParser, ParsedChunk, RoundOutput};
pub use types::{ChatMessage, FunctionCall, Role, ToolCall};
