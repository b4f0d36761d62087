//! The three demo tools.

use rand::RngExt;
use serde_json::{Value, json};

use super::calc::{self, CalcError};
use super::{Tool, ToolError, required_str_arg, str_arg};

/// Current time. Only UTC is supported; other zone names are reported as UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentTimeTool;

impl Tool for CurrentTimeTool {
    fn name(&self) -> &'static str {
        "get_current_time"
    }

    fn description(&self) -> &'static str {
        "Get the current time"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "timezone_name": {
                    "type": "string",
                    "description": "Timezone name (default: UTC)",
                    "default": "UTC"
                }
            }
        })
    }

    fn invoke(&self, args: &Value) -> Result<String, ToolError> {
        let requested = str_arg(args, "timezone_name").unwrap_or("UTC");
        if !requested.eq_ignore_ascii_case("utc") {
            tracing::debug!(requested, "Only UTC is supported; answering in UTC");
        }
        let now = chrono::Utc::now();
        Ok(format!(
            "Current UTC time: {}",
            now.format("%Y-%m-%d %H:%M:%S UTC")
        ))
    }
}

/// Arithmetic on digits, `+ - * / ( )` and spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatorTool;

impl Tool for CalculatorTool {
    fn name(&self) -> &'static str {
        "calculate"
    }

    fn description(&self) -> &'static str {
        "Evaluate an arithmetic expression"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Expression to evaluate (example: 2 + 3 * 4)"
                }
            },
            "required": ["expression"]
        })
    }

    fn invoke(&self, args: &Value) -> Result<String, ToolError> {
        let expression = required_str_arg(self.name(), args, "expression")?;
        // Failures go back to the model as text so it can explain them.
        Ok(match calc::evaluate(expression) {
            Ok(value) => format!("{expression} = {}", calc::format_number(value)),
            Err(CalcError::InvalidCharacters) => {
                "Error: the expression contains invalid characters".to_string()
            }
            Err(e) => format!("Calculation error: {e}"),
        })
    }
}

const CONDITIONS: [&str; 4] = ["sunny", "cloudy", "rainy", "snowy"];

/// Mock weather lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeatherTool;

impl Tool for WeatherTool {
    fn name(&self) -> &'static str {
        "fetch_weather"
    }

    fn description(&self) -> &'static str {
        "Fetch the weather for a city (mock data)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "City name"
                }
            },
            "required": ["city"]
        })
    }

    fn invoke(&self, args: &Value) -> Result<String, ToolError> {
        let city = required_str_arg(self.name(), args, "city")?;
        let mut rng = rand::rng();
        let condition = CONDITIONS[rng.random_range(0..CONDITIONS.len())];
        let temperature: i32 = rng.random_range(-5..=35);
        let humidity: u32 = rng.random_range(30..=90);
        Ok(format!(
            "Weather in {city}: {condition}, temperature {temperature}°C, humidity {humidity}%"
        ))
    }
}
