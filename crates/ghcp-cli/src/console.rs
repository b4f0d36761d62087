//! Colored console output for the demos.
//!
//! Everything here writes to stdout; logs go to stderr so the two never
//! interleave on the same stream.

use std::io::Write;

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};

const RULE_WIDTH: usize = 60;

#[allow(clippy::print_stdout)]
pub fn info(message: &str) {
    println!("{} {message}", "ℹ".blue());
}

#[allow(clippy::print_stdout)]
pub fn success(message: &str) {
    println!("{} {message}", "✓".green());
}

#[allow(clippy::print_stdout)]
pub fn error(message: &str) {
    println!("{} {message}", "✗".red());
}

#[allow(clippy::print_stdout)]
pub fn warning(message: &str) {
    println!("{} {message}", "⚠".yellow());
}

/// Title framed by double rules.
#[allow(clippy::print_stdout)]
pub fn header(title: &str) {
    let rule = "═".repeat(RULE_WIDTH);
    println!();
    println!("{}", rule.as_str().cyan().bold());
    println!("{}", title.cyan().bold());
    println!("{}", rule.as_str().cyan().bold());
    println!();
}

/// Subsection title over a dim single rule.
#[allow(clippy::print_stdout)]
pub fn section(title: &str) {
    println!();
    println!("{}", title.white().bold());
    println!("{}", "─".repeat(RULE_WIDTH).dim());
}

/// Fenced code block.
#[allow(clippy::print_stdout)]
pub fn code(code: &str, language: &str) {
    println!();
    println!("{}", format!("```{language}").dim());
    println!("{code}");
    println!("{}", "```".dim());
    println!();
}

/// `label: value` line.
#[allow(clippy::print_stdout)]
pub fn result(label: &str, value: &str) {
    println!("{} {value}", format!("{label}:").cyan());
}

#[allow(clippy::print_stdout)]
pub fn line(text: &str) {
    println!("{text}");
}

/// Print without a newline and flush, for streamed text.
#[allow(clippy::print_stdout)]
pub fn stream(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

/// Clear the terminal and home the cursor. Failures are ignored.
pub fn clear_screen() {
    let _ = execute!(std::io::stdout(), Clear(ClearType::All), MoveTo(0, 0));
}
