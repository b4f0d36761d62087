//! HTTP chat collaborator for OpenAI-compatible `/chat/completions` APIs.
//!
//! Each `send` runs one turn in a spawned task. The task streams the
//! completion, runs any requested tools locally and loops until the model
//! answers without tool calls, reporting progress through the session's
//! event handler. Streamed bodies are framed into SSE events by
//! `eventsource-stream`, which also reassembles UTF-8 split across chunks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use super::parser::{ChunkParser, RoundOutput};
use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ToolSpec};
use crate::config::UpstreamConfig;
use crate::error::{Error, Result};
use crate::session::{
    ChatClient, ChatSession, EventHandler, MessageOptions, SessionConfig, SessionEvent,
};
use crate::tools::ToolRegistry;

/// Upper bound on completion round trips per turn.
pub const MAX_TOOL_ROUNDS: usize = 8;

/// Client for an OpenAI-compatible inference endpoint.
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChatClient {
    /// Build a client from upstream settings.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::Config("upstream base_url is empty".into()));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| Error::Config("Invalid token format".into()))?;
            headers.insert(AUTHORIZATION, value);
        } else {
            warn!("No upstream token configured; requests will be unauthenticated");
        }

        // reqwest is built with rustls-no-provider; Err means already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn create_session(&self, config: SessionConfig) -> Result<Box<dyn ChatSession>> {
        if config.model.is_empty() {
            return Err(Error::SessionCreate("model is empty".into()));
        }
        let session_id = uuid::Uuid::new_v4().to_string();
        let mut history = Vec::new();
        if let Some(system) = &config.system_message {
            history.push(ChatMessage::system(system.content.clone()));
        }
        let tool_specs: Vec<ToolSpec> = config
            .tools
            .as_ref()
            .map(|tools| tools.definitions().into_iter().map(ToolSpec::function).collect())
            .unwrap_or_default();

        debug!(
            session_id,
            model = config.model,
            tools = tool_specs.len(),
            "Created upstream session"
        );
        Ok(Box::new(HttpSession {
            session_id,
            turn: Arc::new(TurnContext {
                http: self.http.clone(),
                url: self.completions_url(),
                model: config.model,
                streaming: config.streaming,
                tools: config.tools,
                tool_specs,
                history: Mutex::new(history),
            }),
            handler: None,
            task: None,
            closed: false,
        }))
    }
}

/// Shared state of a session, read by its turn tasks.
struct TurnContext {
    http: reqwest::Client,
    url: String,
    model: String,
    streaming: bool,
    tools: Option<Arc<ToolRegistry>>,
    tool_specs: Vec<ToolSpec>,
    history: Mutex<Vec<ChatMessage>>,
}

/// Session backed by [`HttpChatClient`].
pub struct HttpSession {
    session_id: String,
    turn: Arc<TurnContext>,
    handler: Option<EventHandler>,
    task: Option<JoinHandle<()>>,
    closed: bool,
}

#[async_trait]
impl ChatSession for HttpSession {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn on_event(&mut self, handler: EventHandler) {
        self.handler = Some(handler);
    }

    async fn send(&mut self, options: MessageOptions) -> Result<String> {
        if self.closed {
            return Err(Error::SessionClosed {
                session_id: self.session_id.clone(),
            });
        }
        if self.task.as_ref().is_some_and(|task| !task.is_finished()) {
            return Err(Error::TurnInProgress {
                session_id: self.session_id.clone(),
            });
        }

        self.turn
            .history
            .lock()
            .await
            .push(ChatMessage::user(options.prompt));

        let message_id = uuid::Uuid::new_v4().to_string();
        let handler: EventHandler = match self.handler.clone() {
            Some(handler) => handler,
            None => Arc::new(|_: &SessionEvent| {}),
        };
        let turn = Arc::clone(&self.turn);
        let session_id = self.session_id.clone();
        let mid = message_id.clone();
        self.task = Some(tokio::spawn(async move {
            run_turn(&turn, &handler, &session_id, &mid).await;
        }));
        Ok(message_id)
    }

    async fn destroy(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.handler = None;
        self.closed = true;
        debug!(session_id = self.session_id, "Upstream session destroyed");
        Ok(())
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_turn(turn: &TurnContext, handler: &EventHandler, session_id: &str, message_id: &str) {
    match turn.drive(handler).await {
        Ok(content) => {
            info!(
                session_id,
                message_id,
                chars = content.len(),
                "Turn complete"
            );
            handler(&SessionEvent::Message {
                content: Some(content),
            });
        }
        Err(e) => {
            warn!(session_id, message_id, error = %e, "Turn failed");
            handler(&SessionEvent::SessionError {
                message: e.to_string(),
            });
        }
    }
    handler(&SessionEvent::Idle);
}

impl TurnContext {
    /// Run completion rounds until the model stops asking for tools.
    async fn drive(&self, handler: &EventHandler) -> Result<String> {
        for round in 0..MAX_TOOL_ROUNDS {
            let messages = self.history.lock().await.clone();
            let output = self.complete(&messages, handler).await?;

            if output.tool_calls.is_empty() {
                self.history
                    .lock()
                    .await
                    .push(ChatMessage::assistant(output.content.clone()));
                return Ok(output.content);
            }

            debug!(round, calls = output.tool_calls.len(), "Model requested tools");
            let mut results = Vec::with_capacity(output.tool_calls.len());
            for call in &output.tool_calls {
                let name = call.function.name.clone();
                handler(&SessionEvent::ToolExecutionStart {
                    tool_name: Some(name.clone()),
                });
                let result = self.run_tool(&name, &call.function.arguments);
                handler(&SessionEvent::ToolExecutionComplete {
                    tool_name: Some(name),
                    result: Some(result.clone()),
                });
                results.push(ChatMessage::tool_result(call.id.clone(), result));
            }

            let mut history = self.history.lock().await;
            history.push(ChatMessage::assistant_tool_calls(
                output.content,
                output.tool_calls,
            ));
            history.extend(results);
        }
        Err(Error::Stream(format!(
            "model kept calling tools after {MAX_TOOL_ROUNDS} rounds"
        )))
    }

    fn run_tool(&self, name: &str, arguments: &str) -> String {
        let Some(tools) = &self.tools else {
            return format!("Error: tool `{name}` is not available in this session");
        };
        match tools.invoke(name, arguments) {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool invocation failed");
                format!("Error: {e}")
            }
        }
    }

    /// One POST to `/chat/completions`.
    async fn complete(&self, messages: &[ChatMessage], handler: &EventHandler) -> Result<RoundOutput> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            stream: self.streaming,
            tools: (!self.tool_specs.is_empty()).then_some(self.tool_specs.as_slice()),
            tool_choice: (!self.tool_specs.is_empty()).then_some("auto"),
        };

        let resp = self.http.post(&self.url).json(&request).send().await?;
        let resp = check_status(resp).await?;

        if !self.streaming {
            let body: ChatCompletionResponse = resp.json().await?;
            let message = body
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message)
                .ok_or_else(|| Error::Stream("response has no choices".into()))?;
            return Ok(RoundOutput {
                content: message.content.unwrap_or_default(),
                tool_calls: message.tool_calls,
            });
        }

        let mut parser = ChunkParser::new();
        let events = resp.bytes_stream().eventsource();
        tokio::pin!(events);
        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(EventStreamError::Transport(e)) => return Err(Error::Http(e)),
                Err(e) => return Err(Error::Stream(e.to_string())),
            };
            let chunk = parser.parse_data(&event.data)?;
            if let Some(text) = chunk.text {
                handler(&SessionEvent::MessageDelta {
                    delta_content: Some(text),
                });
            }
            if chunk.finished {
                break;
            }
        }
        Ok(parser.finish())
    }
}

/// Map a non-success response to [`Error::Upstream`] with its body text.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("Unknown").to_string()
    } else {
        body
    };
    Err(Error::Upstream {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::SocketAddr;

    use serde_json::Value;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    fn upstream(base_url: &str) -> UpstreamConfig {
        UpstreamConfig {
            base_url: base_url.into(),
            token: Some("t".into()),
            ..UpstreamConfig::default()
        }
    }

    /// Local `/chat/completions` stand-in. The n-th request is answered with
    /// `replies[n]` (the last reply repeats), each reply written as separate
    /// HTTP chunks. Request bodies are recorded in order.
    struct FakeUpstream {
        addr: SocketAddr,
        requests: Arc<std::sync::Mutex<Vec<Value>>>,
    }

    impl FakeUpstream {
        async fn spawn(replies: Vec<Vec<Vec<u8>>>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let requests = Arc::new(std::sync::Mutex::new(Vec::new()));
            let seen = Arc::clone(&requests);
            tokio::spawn(async move {
                let mut round = 0;
                while let Ok((mut socket, _)) = listener.accept().await {
                    let body = read_request_body(&mut socket).await;
                    seen.lock()
                        .unwrap()
                        .push(serde_json::from_slice(&body).unwrap_or(Value::Null));
                    let reply = &replies[round.min(replies.len() - 1)];
                    round += 1;
                    let _ = write_chunked(&mut socket, reply).await;
                }
            });
            Self { addr, requests }
        }

        fn client(&self) -> HttpChatClient {
            HttpChatClient::new(&upstream(&format!("http://{}", self.addr))).unwrap()
        }

        fn requests(&self) -> Vec<Value> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn read_request_body(socket: &mut TcpStream) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return Vec::new();
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            let start = end + 4;
            while buf.len() < start + len {
                let n = socket.read(&mut chunk).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            return buf[start..].to_vec();
        }
    }

    /// The client may hang up once it has seen a finish reason, so write
    /// errors end the reply instead of failing the server.
    async fn write_chunked(socket: &mut TcpStream, chunks: &[Vec<u8>]) -> std::io::Result<()> {
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\n\
                  transfer-encoding: chunked\r\nconnection: close\r\n\r\n",
            )
            .await?;
        for chunk in chunks {
            socket
                .write_all(format!("{:x}\r\n", chunk.len()).as_bytes())
                .await?;
            socket.write_all(chunk).await?;
            socket.write_all(b"\r\n").await?;
            socket.flush().await?;
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        socket.write_all(b"0\r\n\r\n").await?;
        socket.shutdown().await
    }

    fn sse(data: &str) -> Vec<u8> {
        format!("data: {data}\n\n").into_bytes()
    }

    fn calculate_call() -> Vec<Vec<u8>> {
        vec![
            sse(
                r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_a","type":"function","function":{"name":"calculate","arguments":""}}]}}]}"#,
            ),
            sse(
                r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"expression\":\"6*7\"}"}}]},"finish_reason":"tool_calls"}]}"#,
            ),
            sse("[DONE]"),
        ]
    }

    /// Send `prompt` and collect events up to and including `Idle`.
    async fn run_to_idle(client: &HttpChatClient, config: SessionConfig, prompt: &str) -> Vec<SessionEvent> {
        let mut session = client.create_session(config).await.unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        session.on_event(Arc::new(move |event: &SessionEvent| {
            let _ = tx.send(event.clone());
        }));
        session.send(MessageOptions::new(prompt)).await.unwrap();

        let mut events = Vec::new();
        loop {
            let event = tokio::time::timeout(Duration::from_secs(20), rx.recv())
                .await
                .unwrap()
                .unwrap();
            let idle = event == SessionEvent::Idle;
            events.push(event);
            if idle {
                return events;
            }
        }
    }

    #[test]
    fn rejects_empty_base_url() {
        assert!(matches!(
            HttpChatClient::new(&upstream("")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn rejects_token_with_newline() {
        let mut config = upstream("http://localhost");
        config.token = Some("bad\ntoken".into());
        assert!(matches!(HttpChatClient::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn trims_trailing_slash() {
        let client = HttpChatClient::new(&upstream("http://localhost:9/v1/")).unwrap();
        assert_eq!(client.completions_url(), "http://localhost:9/v1/chat/completions");
    }

    #[tokio::test]
    async fn session_ids_are_uuids() {
        let client = HttpChatClient::new(&upstream("http://localhost:9")).unwrap();
        let session = client
            .create_session(SessionConfig::streaming("gpt-4.1").with_system_message("be terse"))
            .await
            .unwrap();
        assert_eq!(session.session_id().len(), 36);
    }

    #[tokio::test]
    async fn empty_model_is_rejected() {
        let client = HttpChatClient::new(&upstream("http://localhost:9")).unwrap();
        assert!(matches!(
            client.create_session(SessionConfig::streaming("")).await,
            Err(Error::SessionCreate(_))
        ));
    }

    #[tokio::test]
    async fn send_after_destroy_fails() {
        let client = HttpChatClient::new(&upstream("http://localhost:9")).unwrap();
        let mut session = client
            .create_session(SessionConfig::streaming("gpt-4.1"))
            .await
            .unwrap();
        session.destroy().await.unwrap();
        assert!(matches!(
            session.send(MessageOptions::new("hi")).await,
            Err(Error::SessionClosed { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_upstream_reports_error_then_idle() {
        // Port 9 (discard) is closed on test machines; the connect fails fast.
        let client = HttpChatClient::new(&upstream("http://127.0.0.1:9")).unwrap();
        let mut session = client
            .create_session(SessionConfig::streaming("gpt-4.1"))
            .await
            .unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        session.on_event(Arc::new(move |event: &SessionEvent| {
            let _ = tx.send(event.clone());
        }));
        session.send(MessageOptions::new("hi")).await.unwrap();

        let first = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(first, SessionEvent::SessionError { .. }));
        let second = rx.recv().await.unwrap();
        assert_eq!(second, SessionEvent::Idle);
    }

    #[tokio::test]
    async fn multibyte_text_split_across_chunks_is_preserved() {
        let event = sse(r#"{"choices":[{"delta":{"content":"こんにちは"}}]}"#);
        // Cut inside the first character's three UTF-8 bytes.
        let cut = event.iter().position(|&b| b >= 0x80).unwrap() + 1;
        let server = FakeUpstream::spawn(vec![vec![
            event[..cut].to_vec(),
            event[cut..].to_vec(),
            sse("[DONE]"),
        ]])
        .await;

        let events = run_to_idle(&server.client(), SessionConfig::streaming("gpt-4.1"), "hi").await;
        assert_eq!(
            events,
            vec![
                SessionEvent::MessageDelta {
                    delta_content: Some("こんにちは".into())
                },
                SessionEvent::Message {
                    content: Some("こんにちは".into())
                },
                SessionEvent::Idle,
            ]
        );
    }

    #[tokio::test]
    async fn tool_calls_run_locally_and_feed_the_next_round() {
        let server = FakeUpstream::spawn(vec![
            calculate_call(),
            vec![
                sse(r#"{"choices":[{"delta":{"content":"It is 42."}}]}"#),
                sse("[DONE]"),
            ],
        ])
        .await;
        let config =
            SessionConfig::streaming("gpt-4.1").with_tools(Arc::new(ToolRegistry::demo()));

        let events = run_to_idle(&server.client(), config, "what is 6*7?").await;
        assert_eq!(
            events,
            vec![
                SessionEvent::ToolExecutionStart {
                    tool_name: Some("calculate".into())
                },
                SessionEvent::ToolExecutionComplete {
                    tool_name: Some("calculate".into()),
                    result: Some("6*7 = 42".into()),
                },
                SessionEvent::MessageDelta {
                    delta_content: Some("It is 42.".into())
                },
                SessionEvent::Message {
                    content: Some("It is 42.".into())
                },
                SessionEvent::Idle,
            ]
        );

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["tool_choice"], "auto");
        assert_eq!(requests[0]["tools"].as_array().unwrap().len(), 3);
        assert_eq!(requests[0]["tools"], requests[1]["tools"]);

        let messages = requests[1]["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["tool_calls"][0]["id"], "call_a");
        assert_eq!(
            messages[1]["tool_calls"][0]["function"]["arguments"],
            r#"{"expression":"6*7"}"#
        );
        assert_eq!(messages[2]["role"], "tool");
        assert_eq!(messages[2]["tool_call_id"], "call_a");
        assert_eq!(messages[2]["content"], "6*7 = 42");
    }

    #[tokio::test]
    async fn endless_tool_calls_stop_at_the_round_limit() {
        let server = FakeUpstream::spawn(vec![calculate_call()]).await;
        let config =
            SessionConfig::streaming("gpt-4.1").with_tools(Arc::new(ToolRegistry::demo()));

        let events = run_to_idle(&server.client(), config, "loop").await;
        let starts = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::ToolExecutionStart { .. }))
            .count();
        let completes = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::ToolExecutionComplete { .. }))
            .count();
        assert_eq!(starts, MAX_TOOL_ROUNDS);
        assert_eq!(completes, MAX_TOOL_ROUNDS);
        assert_eq!(server.requests().len(), MAX_TOOL_ROUNDS);

        let [.., error, idle] = events.as_slice() else {
            panic!("too few events: {events:?}");
        };
        assert!(
            matches!(error, SessionEvent::SessionError { message } if message.contains("after 8 rounds")),
            "unexpected event: {error:?}"
        );
        assert_eq!(*idle, SessionEvent::Idle);
    }
}
