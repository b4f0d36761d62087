//! Shared tracing/logging initialization.
//!
//! The web server and the demo CLI both install a `tracing_subscriber`
//! registry with an env-filter; only the server offers JSON output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Where formatted log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTarget {
    #[default]
    Stdout,
    /// Keeps interactive prompts on stdout readable.
    Stderr,
}

/// Initialise the global tracing subscriber.
///
/// * `default_filter` -- `RUST_LOG` value used when the env-var is not set
///   (e.g. `"ghcp_web=info,ghcp_core=info"`).
/// * `log_json` -- emit structured JSON lines instead of the human format.
pub fn init_tracing(default_filter: &str, log_json: bool, target: LogTarget) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
    );
    let registry = tracing_subscriber::registry().with(env_filter);
    match (log_json, target) {
        (true, LogTarget::Stdout) => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        (true, LogTarget::Stderr) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        (false, LogTarget::Stdout) => registry.with(tracing_subscriber::fmt::layer()).init(),
        (false, LogTarget::Stderr) => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Build the filter directive for a set of crate targets at one level,
/// e.g. `filter_for(&["ghcp_web", "ghcp_core"], "debug")`.
pub fn filter_for(targets: &[&str], level: &str) -> String {
    targets
        .iter()
        .map(|t| format!("{t}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_joins_targets() {
        assert_eq!(
            filter_for(&["ghcp_web", "ghcp_core"], "debug"),
            "ghcp_web=debug,ghcp_core=debug"
        );
    }

    #[test]
    fn filter_empty_targets() {
        assert_eq!(filter_for(&[], "info"), "");
    }
}
