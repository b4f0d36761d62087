//! The three menu demos.

pub mod chat;
pub mod codegen;
pub mod context;

use std::fmt;

pub use chat::ChatDemo;
pub use codegen::CodegenDemo;
pub use context::ContextDemo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoKind {
    Chat,
    Codegen,
    Context,
}

impl DemoKind {
    pub const ALL: [Self; 3] = [Self::Chat, Self::Codegen, Self::Context];

    /// Menu entry text.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Chat => "💬 Chat demo - interactive conversation",
            Self::Codegen => "🔨 Code generation demo - code from natural language",
            Self::Context => "🧠 Context-aware demo - suggestions that understand your project",
        }
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Chat => "chat",
            Self::Codegen => "codegen",
            Self::Context => "context",
        })
    }
}
