//! Fixed session settings of the codegen and tools endpoints.

/// Language used when a codegen request names none.
pub const DEFAULT_LANGUAGE: &str = "python";

pub const CODEGEN_SYSTEM_MESSAGE: &str = "You are an excellent programmer. \
    Generate clean, working code based on the user's description. \
    Output only the code, with comments where they help. \
    Write the code in the language the user specifies.";

pub const TOOLS_SYSTEM_MESSAGE: &str = "You are an assistant. \
    Use the available tools when needed to give accurate information. \
    Explain the tool results in natural language.";

/// Prompt sent for a codegen request.
pub fn codegen_prompt(language: &str, description: &str) -> String {
    format!("Language: {language}\n\n{description}")
}
