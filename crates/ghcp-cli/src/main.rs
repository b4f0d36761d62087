//! ghcp demo CLI
//!
//! Interactive menu with the chat, code generation and context-aware demos.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use ghcp_cli::app::{App, EXIT_MESSAGE};
use ghcp_cli::console;
use ghcp_cli::demos::DemoKind;
use ghcp_cli::live::LiveChat;
use ghcp_cli::prompt::{TerminalPrompter, is_interrupted};
use ghcp_core::config::load_config;
use ghcp_core::tracing_init::{LogTarget, filter_for, init_tracing};
use ghcp_core::upstream::HttpChatClient;

#[derive(Parser)]
#[command(name = "ghcp-demo", version, about = "Interactive chat SDK demos")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Stream chat replies from the configured upstream instead of mock text.
    #[arg(long, global = true)]
    live: bool,

    /// Model for live chat replies.
    #[arg(long, global = true, env = "COPILOT_MODEL")]
    model: Option<String>,

    /// Log level (logs go to stderr).
    #[arg(long, global = true, env = "GHCP_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Directory searched for `.ghcp-demo/settings.json` (default: cwd).
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the chat demo directly.
    Chat,
    /// Run the code generation demo directly.
    Codegen,
    /// Run the context-aware demo directly.
    Context,
}

impl Commands {
    const fn kind(&self) -> DemoKind {
        match self {
            Self::Chat => DemoKind::Chat,
            Self::Codegen => DemoKind::Codegen,
            Self::Context => DemoKind::Context,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(
        &filter_for(&["ghcp_cli", "ghcp_core"], &cli.log_level),
        false,
        LogTarget::Stderr,
    );

    let live = if cli.live {
        let project_dir = match cli.project_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        let mut config = load_config(Some(&project_dir))?;
        if let Some(model) = cli.model {
            config.upstream.default_model = model;
        }
        info!(
            model = config.upstream.default_model,
            upstream = config.upstream.base_url,
            "Live chat enabled"
        );
        let client = HttpChatClient::new(&config.upstream)?;
        Some(LiveChat::new(Arc::new(client), config.upstream.default_model))
    } else {
        None
    };

    let mut app = App::new(TerminalPrompter, live);
    let run = async {
        match &cli.command {
            Some(command) => app.run_demo(command.kind()).await,
            None => app.run().await,
        }
    };

    let result = tokio::select! {
        result = run => result,
        _ = tokio::signal::ctrl_c() => {
            console::line("");
            console::success(EXIT_MESSAGE);
            return Ok(());
        }
    };

    match result {
        Err(e) if is_interrupted(&e) => {
            console::line("");
            console::success(EXIT_MESSAGE);
            Ok(())
        }
        other => other,
    }
}
