use std::time::Duration;

use anyhow::Result;

use crate::console;
use crate::prompt::Prompter;

const ANALYSIS_DELAY: Duration = Duration::from_millis(1200);

/// Menu label and scenario key.
pub const SCENARIOS: [(&str, &str); 3] = [
    ("Scenario 1: analyse a Python project", "python-project"),
    ("Scenario 2: suggestions for a RESTful API", "api-implementation"),
    ("Scenario 3: generate test code", "test-generation"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextAnalysis {
    pub file_type: String,
    pub code_style: String,
    pub dependencies: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ContextAnalysis {
    fn new(file_type: &str, code_style: &str, dependencies: &[&str], suggestions: &[&str]) -> Self {
        Self {
            file_type: file_type.to_string(),
            code_style: code_style.to_string(),
            dependencies: dependencies.iter().map(ToString::to_string).collect(),
            suggestions: suggestions.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Canned analysis for a scenario key. Unknown keys get a placeholder.
pub fn mock_analysis(scenario: &str) -> ContextAnalysis {
    match scenario {
        "python-project" => ContextAnalysis::new(
            "Python Project",
            "Type Hints, PEP 8, Black formatter",
            &["rich", "InquirerPy", "python-dotenv"],
            &[
                "The pyproject.toml settings look right",
                "Type hints are used consistently",
                "The coding style follows PEP 8",
                "Static type checking with mypy is enabled",
            ],
        ),
        "api-implementation" => ContextAnalysis::new(
            "REST API Implementation",
            "FastAPI + Python",
            &["fastapi", "uvicorn", "pydantic"],
            &[
                "Add error handling in a middleware",
                "Consider versioning the API",
                "Adding rate limiting is recommended",
                "Consider generating OpenAPI/Swagger docs",
            ],
        ),
        "test-generation" => ContextAnalysis::new(
            "Unit Test",
            "pytest + Python",
            &["pytest", "pytest-cov", "pytest-asyncio"],
            &[
                "Add tests to reach at least 80% coverage",
                "Add tests for the edge cases",
                "Fixtures are used appropriately",
                "Test names follow a consistent convention",
            ],
        ),
        _ => ContextAnalysis::new("Unknown", "Standard", &[], &["Analyzing context..."]),
    }
}

/// What the SDK draws on, by category.
const CONTEXT_SOURCES: [(&str, [&str; 3]); 4] = [
    (
        "📁 Project structure",
        ["Directory layout", "File naming conventions", "Module organisation"],
    ),
    (
        "📦 Dependencies",
        ["pyproject.toml / requirements.txt", "import statements", "Libraries in use"],
    ),
    (
        "💻 Code style",
        ["Existing coding conventions", "Formatter settings", "Naming patterns"],
    ),
    (
        "🔗 Related files",
        [
            "Files in the same directory",
            "Imported modules",
            "Tests paired with their implementation",
        ],
    ),
];

/// Project-context analysis demo with canned results.
#[derive(Debug, Default)]
pub struct ContextDemo;

impl ContextDemo {
    pub async fn run(&self, prompter: &mut dyn Prompter) -> Result<()> {
        console::header("Chat SDK - context-aware demo");
        console::info("See how the SDK understands the context of a project.\n");

        let items: Vec<String> = SCENARIOS.iter().map(|(label, _)| (*label).to_string()).collect();
        let choice = prompter.select("Pick a scenario", &items)?;
        let scenario = SCENARIOS.get(choice).map_or("", |(_, key)| *key);

        console::section("Analyzing context...");
        tokio::time::sleep(ANALYSIS_DELAY).await;
        let analysis = mock_analysis(scenario);

        show_analysis(&analysis);
        show_context_sources();
        Ok(())
    }
}

fn show_analysis(analysis: &ContextAnalysis) {
    console::success("Context analysis finished!\n");
    console::result("File type", &analysis.file_type);
    console::result("Code style", &analysis.code_style);

    if !analysis.dependencies.is_empty() {
        console::section("Detected dependencies");
        for dep in &analysis.dependencies {
            console::line(&format!("  • {dep}"));
        }
    }

    console::section("Suggestions");
    for (i, suggestion) in analysis.suggestions.iter().enumerate() {
        console::line(&format!("  {}. {suggestion}", i + 1));
    }
    console::line("");
}

fn show_context_sources() {
    console::section("Context awareness in the SDK");
    console::line("The SDK draws on:\n");
    for (title, items) in CONTEXT_SOURCES {
        console::line(title);
        for item in items {
            console::line(&format!("   • {item}"));
        }
        console::line("");
    }
    console::info("That is what lets it make suggestions tailored to your project!");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::prompt::testing::{Answer, ScriptedPrompter};

    #[test]
    fn every_scenario_has_an_analysis() {
        for (_, key) in SCENARIOS {
            let analysis = mock_analysis(key);
            assert_ne!(analysis.file_type, "Unknown", "{key}");
            assert_eq!(analysis.dependencies.len(), 3);
            assert_eq!(analysis.suggestions.len(), 4);
        }
    }

    #[test]
    fn api_scenario_lists_fastapi_stack() {
        let analysis = mock_analysis("api-implementation");
        assert_eq!(analysis.file_type, "REST API Implementation");
        assert_eq!(analysis.code_style, "FastAPI + Python");
        assert_eq!(analysis.dependencies, vec!["fastapi", "uvicorn", "pydantic"]);
    }

    #[test]
    fn unknown_scenario_falls_back() {
        let analysis = mock_analysis("kotlin-app");
        assert_eq!(analysis.file_type, "Unknown");
        assert_eq!(analysis.code_style, "Standard");
        assert!(analysis.dependencies.is_empty());
        assert_eq!(analysis.suggestions, vec!["Analyzing context..."]);
    }

    #[tokio::test(start_paused = true)]
    async fn run_completes_for_a_scenario() {
        let mut prompter = ScriptedPrompter::new([Answer::Select(2)]);
        ContextDemo.run(&mut prompter).await.unwrap();
        assert_eq!(prompter.prompts, vec!["Pick a scenario"]);
    }
}
