//! HTTP routes: the demo page, health check and the SSE relay endpoints.
//!
//! Each `POST /api/*` opens one upstream session and streams its frames back
//! as `text/event-stream`.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Json, State};
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use tokio_stream::StreamExt;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use ghcp_core::relay::{self, EventClassifier, StandardClassifier};
use ghcp_core::session::{ChatClient, MessageOptions, SessionConfig};
use ghcp_core::tools::ToolRegistry;

use crate::presets::{self, CODEGEN_SYSTEM_MESSAGE, TOOLS_SYSTEM_MESSAGE};

const INDEX_HTML: &str = include_str!("../static/index.html");
const APP_JS: &str = include_str!("../static/app.js");

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn ChatClient>,
    /// Model used when a request does not name one.
    pub default_model: String,
    /// Tools offered on `/api/tools`.
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    /// State with the demo tool set.
    pub fn new(client: Arc<dyn ChatClient>, default_model: impl Into<String>) -> Self {
        Self {
            client,
            default_model: default_model.into(),
            tools: Arc::new(ToolRegistry::demo()),
        }
    }

    fn model_for(&self, requested: Option<String>) -> String {
        requested
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.default_model.clone())
    }
}

/// Body of `/api/chat` and `/api/tools`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// Body of `/api/codegen`.
#[derive(Debug, Deserialize)]
pub struct CodegenRequest {
    #[serde(alias = "description")]
    pub prompt: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub model: Option<String>,
}

fn default_language() -> String {
    presets::DEFAULT_LANGUAGE.to_string()
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/static/app.js", get(app_js))
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/codegen", post(codegen))
        .route("/api/tools", post(tools))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /`
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /static/app.js`
pub async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS,
    )
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `POST /api/chat`: plain streaming chat.
pub async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    let config = SessionConfig::streaming(state.model_for(req.model));
    relay_response(&state, "chat", config, req.prompt, StandardClassifier::chat()).await
}

/// `POST /api/codegen`: code generation with a fixed system message.
pub async fn codegen(State(state): State<AppState>, Json(req): Json<CodegenRequest>) -> Response {
    if req.prompt.trim().is_empty() {
        return empty_prompt();
    }
    let config = SessionConfig::streaming(state.model_for(req.model))
        .with_system_message(CODEGEN_SYSTEM_MESSAGE);
    let prompt = presets::codegen_prompt(&req.language, &req.prompt);
    relay_response(&state, "codegen", config, prompt, StandardClassifier::chat()).await
}

/// `POST /api/tools`: chat with the demo tools; tool starts are forwarded.
pub async fn tools(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    let config = SessionConfig::streaming(state.model_for(req.model))
        .with_system_message(TOOLS_SYSTEM_MESSAGE)
        .with_tools(Arc::clone(&state.tools));
    relay_response(
        &state,
        "tools",
        config,
        req.prompt,
        StandardClassifier::with_tools(),
    )
    .await
}

fn empty_prompt() -> Response {
    (StatusCode::BAD_REQUEST, "prompt must not be empty").into_response()
}

/// Start a relay and stream its frames, one SSE `data:` message each.
///
/// Creation or send failures become `502 Bad Gateway` with the error text.
async fn relay_response<C: EventClassifier>(
    state: &AppState,
    endpoint: &'static str,
    config: SessionConfig,
    prompt: String,
    classifier: C,
) -> Response {
    if prompt.trim().is_empty() {
        return empty_prompt();
    }
    let model = config.model.clone();
    match relay::start(
        state.client.as_ref(),
        config,
        MessageOptions::new(prompt),
        classifier,
    )
    .await
    {
        Ok(stream) => {
            info!(endpoint, model, session_id = stream.session_id(), "Streaming relay");
            let events = stream.map(|frame| Event::default().json_data(frame));
            Sse::new(events).into_response()
        }
        Err(e) => {
            warn!(endpoint, model, error = %e, "Failed to start relay");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}
