//! Tools the model may call during a tools session.
//!
//! Tools run locally inside the collaborator's turn loop; the relay only
//! ever sees their `tool.execution_start` notifications.

mod builtin;
mod calc;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

pub use builtin::{CalculatorTool, CurrentTimeTool, WeatherTool};
pub use calc::{CalcError, evaluate};

/// Tool invocation error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}

/// A function the model can call.
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;

    /// Run the tool. The returned text is handed back to the model.
    fn invoke(&self, args: &Value) -> Result<String, ToolError>;
}

/// Name, description and schema of a tool as sent upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Ordered set of tools available to a session.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|t| t.name()))
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `get_current_time`, `calculate` and `fetch_weather`.
    pub fn demo() -> Self {
        let mut registry = Self::new();
        registry.register(CurrentTimeTool);
        registry.register(CalculatorTool);
        registry.register(WeatherTool);
        registry
    }

    /// Add a tool. A tool with the same name is replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect()
    }

    /// Invoke `name` with raw JSON `arguments`.
    ///
    /// Empty argument text is treated as `{}`.
    pub fn invoke(&self, name: &str, arguments: &str) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let args: Value = if arguments.trim().is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(arguments).map_err(|e| ToolError::InvalidArguments {
                tool: name.to_string(),
                message: e.to_string(),
            })?
        };
        tool.invoke(&args)
    }
}

/// Read an optional string argument.
fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

/// Read a required string argument.
fn required_str_arg<'a>(tool: &str, args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    str_arg(args, key).ok_or_else(|| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: format!("missing string argument `{key}`"),
    })
}
