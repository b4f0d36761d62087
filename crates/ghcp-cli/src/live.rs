//! Live chat replies through the relay bridge.

use std::sync::Arc;

use anyhow::{Result, bail};
use tokio_stream::StreamExt;
use tracing::debug;

use ghcp_core::relay::{self, Frame, StandardClassifier};
use ghcp_core::session::{ChatClient, MessageOptions, SessionConfig};

/// Streams chat replies from a real collaborator, one session per turn.
#[derive(Clone)]
pub struct LiveChat {
    client: Arc<dyn ChatClient>,
    model: String,
}

impl LiveChat {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `prompt` and hand each delta to `on_delta` as it arrives.
    ///
    /// Returns the full reply: the final message when one arrives, else the
    /// concatenated deltas. An error frame fails the turn.
    pub async fn reply<F>(&self, prompt: &str, mut on_delta: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let mut stream = relay::start(
            self.client.as_ref(),
            SessionConfig::streaming(self.model.clone()),
            MessageOptions::new(prompt),
            StandardClassifier::chat(),
        )
        .await?;
        debug!(session_id = stream.session_id(), model = self.model, "Live chat turn");

        let mut streamed = String::new();
        let mut message = None;
        while let Some(frame) = stream.next().await {
            match frame {
                Frame::Delta { content } => {
                    on_delta(&content);
                    streamed.push_str(&content);
                }
                Frame::Done { content } => message = Some(content),
                Frame::ToolStart { .. } => {}
                Frame::Error { message } => {
                    stream.close().await;
                    bail!("chat session failed: {message}");
                }
            }
        }

        Ok(message.filter(|m| !m.is_empty()).unwrap_or(streamed))
    }
}
