use std::time::Duration;

use anyhow::Result;

use crate::console;
use crate::prompt::Prompter;

const MOCK_DELAY: Duration = Duration::from_secs(1);

/// Languages offered for a custom request.
pub const LANGUAGES: [&str; 6] = ["python", "typescript", "javascript", "java", "go", "rust"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRequest {
    pub description: String,
    pub language: String,
}

struct Sample {
    description: &'static str,
    language: &'static str,
}

const SAMPLES: [Sample; 3] = [
    Sample {
        description: "A function that computes the Fibonacci sequence",
        language: "python",
    },
    Sample {
        description: "A function that reads and parses a JSON file",
        language: "python",
    },
    Sample {
        description: "A function that sends a REST API GET request",
        language: "python",
    },
];

const FIBONACCI_PY: &str = r#"def fibonacci(n: int) -> int:
    """Return the n-th Fibonacci number."""
    if n <= 1:
        return n
    return fibonacci(n - 1) + fibonacci(n - 2)


def fibonacci_memo(n: int, memo: dict[int, int] | None = None) -> int:
    """Memoized Fibonacci."""
    if memo is None:
        memo = {}
    if n <= 1:
        return n
    if n in memo:
        return memo[n]

    result = fibonacci_memo(n - 1, memo) + fibonacci_memo(n - 2, memo)
    memo[n] = result
    return result


# Usage
print(fibonacci(10))        # 55
print(fibonacci_memo(50))   # 12586269025"#;

const READ_JSON_PY: &str = r#"import json
from pathlib import Path
from typing import Any


def read_json_file(file_path: str | Path) -> dict[str, Any]:
    """
    Read and parse a JSON file.

    Args:
        file_path: Path to the JSON file

    Returns:
        The parsed JSON data

    Raises:
        FileNotFoundError: If the file does not exist
        ValueError: If the file is not valid JSON
    """
    path = Path(file_path)
    try:
        data: dict[str, Any] = json.loads(path.read_text(encoding="utf-8"))
        return data
    except FileNotFoundError:
        raise FileNotFoundError(f"File not found: {path}")
    except json.JSONDecodeError as e:
        raise ValueError(f"Failed to parse JSON: {e.msg}") from e


# Usage
if __name__ == "__main__":
    data = read_json_file("config.json")
    print(data)"#;

const REST_GET_PY: &str = r#"import httpx
from typing import Any


async def fetch_data(
    url: str,
    headers: dict[str, str] | None = None,
    params: dict[str, str] | None = None,
) -> Any:
    """
    Send a REST API GET request.

    Args:
        url: Request URL
        headers: Extra request headers
        params: Query parameters

    Returns:
        The JSON body of the response

    Raises:
        httpx.HTTPStatusError: On an HTTP error status
    """
    default_headers = {"Content-Type": "application/json"}
    if headers:
        default_headers.update(headers)

    async with httpx.AsyncClient() as client:
        response = await client.get(
            url, headers=default_headers, params=params
        )
        response.raise_for_status()
        return response.json()


# Usage
if __name__ == "__main__":
    import asyncio

    async def main() -> None:
        data = await fetch_data("https://api.example.com/data")
        print(data)

    asyncio.run(main())"#;

const FEATURES: [&str; 5] = [
    "Accurate code generation from natural language",
    "Support for many programming languages",
    "Generation that understands the project context",
    "Code that follows best practices",
    "Error handling and documentation included",
];

/// Natural-language to code demo with canned output.
#[derive(Debug, Default)]
pub struct CodegenDemo;

impl CodegenDemo {
    pub async fn run(&self, prompter: &mut dyn Prompter) -> Result<()> {
        console::header("Chat SDK - code generation demo");
        console::info("Generate code from a natural-language description.\n");

        console::section("Samples");
        for (i, sample) in SAMPLES.iter().enumerate() {
            console::line(&format!("{}. {} ({})", i + 1, sample.description, sample.language));
        }
        console::line("");

        let request = choose_request(prompter)?;

        console::section("Generating code...");
        let code = generate_code(&request).await;

        console::success("Code generation finished!\n");
        console::result("Description", &request.description);
        console::result("Language", &request.language);
        console::code(&code, &request.language);

        console::section("Code generation features");
        for feature in FEATURES {
            console::line(&format!("• {feature}"));
        }
        console::line("");
        Ok(())
    }
}

/// Ask for a sample or a custom description and language.
pub fn choose_request(prompter: &mut dyn Prompter) -> Result<CodeRequest> {
    let mut items: Vec<String> = SAMPLES
        .iter()
        .enumerate()
        .map(|(i, s)| format!("Sample {}: {} ({})", i + 1, s.description, s.language))
        .collect();
    items.push("Custom: describe your own".to_string());

    let choice = prompter.select("Pick a demo", &items)?;
    if let Some(sample) = SAMPLES.get(choice) {
        return Ok(CodeRequest {
            description: sample.description.to_string(),
            language: sample.language.to_string(),
        });
    }

    let description = prompter.text("Describe the code")?;
    let languages: Vec<String> = LANGUAGES.iter().map(ToString::to_string).collect();
    let language = prompter.select("Programming language", &languages)?;
    Ok(CodeRequest {
        description,
        language: LANGUAGES[language].to_string(),
    })
}

async fn generate_code(request: &CodeRequest) -> String {
    tokio::time::sleep(MOCK_DELAY).await;
    mock_code(&request.description, &request.language)
}

/// Canned code for `description`; the samples get real python snippets.
pub fn mock_code(description: &str, language: &str) -> String {
    if language == "python" {
        if description.contains("Fibonacci") {
            return FIBONACCI_PY.to_string();
        }
        if description.contains("JSON") {
            return READ_JSON_PY.to_string();
        }
        if description.contains("REST API") {
            return REST_GET_PY.to_string();
        }
    }
    format!(
        "# {description}\n\
         # Language: {language}\n\
         # Placeholder: a live session returns real code here\n\
         \n\
         \n\
         def example() -> None:\n    \
         \"\"\"Generated code would appear here\"\"\"\n    \
         print(\"Code generation demo\")\n"
    )
}
