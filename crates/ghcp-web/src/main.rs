//! ghcp web server
//!
//! Demo page plus the SSE chat, codegen and tools endpoints.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use ghcp_core::config::load_config;
use ghcp_core::tracing_init::{LogTarget, filter_for, init_tracing};
use ghcp_core::upstream::HttpChatClient;
use ghcp_web::routes::{AppState, build_router};

#[derive(Parser, Debug)]
#[command(name = "ghcp-web")]
#[command(version, about = "ghcp demo web server - streaming chat over SSE")]
struct Args {
    /// Address to listen on (default 0.0.0.0:8000).
    #[arg(long, env = "GHCP_ADDR")]
    addr: Option<SocketAddr>,

    /// Default model for requests that do not name one.
    #[arg(long, env = "COPILOT_MODEL")]
    model: Option<String>,

    /// OpenAI-compatible API base URL.
    #[arg(long, env = "GHCP_BASE_URL")]
    base_url: Option<String>,

    /// Log level for the ghcp crates.
    #[arg(long, env = "GHCP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "GHCP_LOG_JSON")]
    log_json: bool,

    /// Directory searched for `.ghcp-demo/settings.json` (default: cwd).
    #[arg(long)]
    project_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let project_dir = match args.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let mut config = load_config(Some(&project_dir))?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(model) = args.model {
        config.upstream.default_model = model;
    }
    if let Some(base_url) = args.base_url {
        config.upstream.base_url = base_url;
    }
    if let Some(level) = args.log_level {
        config.server.log_level = level;
    }

    init_tracing(
        &filter_for(
            &["ghcp_web", "ghcp_core", "tower_http"],
            &config.server.log_level,
        ),
        args.log_json,
        LogTarget::Stdout,
    );

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.addr,
        model = config.upstream.default_model,
        upstream = config.upstream.base_url,
        "Starting ghcp-web"
    );

    let client = HttpChatClient::new(&config.upstream)?;
    let state = AppState::new(Arc::new(client), config.upstream.default_model.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.addr).await?;
    info!(addr = %config.server.addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;

    info!("ghcp-web stopped");
    Ok(())
}
