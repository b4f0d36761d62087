//! Session → frame stream bridge.
//!
//! ```text
//! collaborator dispatch → EventHandler → classifier → mpsc (FIFO) → FrameStream
//! ```
//!
//! The handler never blocks: it classifies, pushes at most one frame and,
//! on a terminating event, a termination marker. The stream yields frames
//! until it reads the marker, so anything queued before `idle` is still
//! delivered. The session is destroyed exactly once, whichever of
//! exhaustion, [`FrameStream::close`] or drop comes first.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

use super::classifier::EventClassifier;
use super::frame::Frame;
use crate::error::Result;
use crate::session::{
    ChatClient, ChatSession, EventHandler, MessageOptions, SessionConfig, SessionEvent,
};

enum Slot {
    Frame(Frame),
    Terminate,
}

type ReleaseFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

enum State {
    Streaming,
    Releasing(ReleaseFuture),
    Finished,
}

/// Ordered, lazily produced frames of one relay.
pub struct FrameStream {
    session_id: String,
    rx: mpsc::UnboundedReceiver<Slot>,
    session: Option<Box<dyn ChatSession>>,
    state: State,
}

impl FrameStream {
    /// Subscribe to `session` and route its events through `classifier`.
    ///
    /// Must be called before the first `send` on the session.
    pub fn attach<C: EventClassifier>(mut session: Box<dyn ChatSession>, classifier: C) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let session_id = session.session_id().to_string();

        let handler: EventHandler = Arc::new(move |event: &SessionEvent| {
            let classification = classifier.classify(event);
            if let Some(frame) = classification.frame
                && !frame.is_empty_delta()
            {
                // Receiver gone means the consumer disconnected.
                let _ = tx.send(Slot::Frame(frame));
            }
            if classification.terminate {
                let _ = tx.send(Slot::Terminate);
            }
        });
        session.on_event(handler);

        debug!(session_id, "Relay attached");
        Self {
            session_id,
            rx,
            session: Some(session),
            state: State::Streaming,
        }
    }

    /// Collaborator-assigned id of the relayed session.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn send(&mut self, options: MessageOptions) -> Result<String> {
        match self.session.as_mut() {
            Some(session) => session.send(options).await,
            None => Err(crate::Error::SessionClosed {
                session_id: self.session_id.clone(),
            }),
        }
    }

    /// Stop relaying and destroy the session now.
    ///
    /// Frames still buffered are discarded.
    pub async fn close(mut self) {
        self.rx.close();
        if let Some(session) = self.session.take() {
            release(self.session_id.clone(), session).await;
        } else if let State::Releasing(fut) = std::mem::replace(&mut self.state, State::Finished)
        {
            fut.await;
        }
        self.state = State::Finished;
    }
}

impl Stream for FrameStream {
    type Item = Frame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Frame>> {
        let this = &mut *self;
        loop {
            match &mut this.state {
                State::Finished => return Poll::Ready(None),
                State::Releasing(fut) => {
                    ready!(fut.as_mut().poll(cx));
                    this.state = State::Finished;
                    return Poll::Ready(None);
                }
                State::Streaming => match ready!(this.rx.poll_recv(cx)) {
                    Some(Slot::Frame(frame)) => return Poll::Ready(Some(frame)),
                    Some(Slot::Terminate) | None => {
                        this.rx.close();
                        this.state = match this.session.take() {
                            Some(session) => {
                                State::Releasing(Box::pin(release(this.session_id.clone(), session)))
                            }
                            None => State::Finished,
                        };
                    }
                },
            }
        }
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        let pending: Option<ReleaseFuture> = match self.session.take() {
            Some(session) => {
                info!(session_id = %self.session_id, "Relay dropped before completion");
                Some(Box::pin(release(self.session_id.clone(), session)))
            }
            None => match std::mem::replace(&mut self.state, State::Finished) {
                State::Releasing(fut) => Some(fut),
                State::Streaming | State::Finished => None,
            },
        };
        let Some(fut) = pending else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(fut);
            }
            Err(_) => warn!(
                session_id = %self.session_id,
                "No runtime to release session; dropping it"
            ),
        }
    }
}

async fn release(session_id: String, mut session: Box<dyn ChatSession>) {
    match session.destroy().await {
        Ok(()) => debug!(session_id, "Session released"),
        Err(e) => warn!(session_id, error = %e, "Failed to destroy session"),
    }
}

/// Create a session, attach a relay and send the prompt.
///
/// Creation and send failures are returned to the caller; a session that
/// was created is destroyed before a send failure is returned.
pub async fn start<C: EventClassifier>(
    client: &dyn ChatClient,
    config: SessionConfig,
    options: MessageOptions,
    classifier: C,
) -> Result<FrameStream> {
    let model = config.model.clone();
    let session = client.create_session(config).await?;
    let mut stream = FrameStream::attach(session, classifier);

    match stream.send(options).await {
        Ok(message_id) => {
            info!(session_id = stream.session_id(), message_id, model, "Relay started");
            Ok(stream)
        }
        Err(e) => {
            warn!(session_id = stream.session_id(), error = %e, "Send failed");
            stream.close().await;
            Err(e)
        }
    }
}
