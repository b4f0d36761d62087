//! Scripted collaborator for tests.
//!
//! [`ScriptedClient`] hands out sessions that replay a fixed event script
//! when a message is sent, and records what the bridge did with them
//! through a shared [`SessionProbe`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::session::{
    ChatClient, ChatSession, EventHandler, MessageOptions, SessionConfig, SessionEvent,
};

/// How a scripted session delivers its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    /// Every event is delivered inside `send`, before it returns.
    #[default]
    Inline,
    /// Events are delivered from a spawned task, yielding between events.
    Task,
}

#[derive(Default)]
struct ProbeInner {
    created: AtomicUsize,
    destroyed: AtomicUsize,
    destroy_notify: Notify,
    configs: Mutex<Vec<SessionConfig>>,
    prompts: Mutex<Vec<String>>,
}

/// Shared view of what happened to the sessions of one client.
#[derive(Clone, Default)]
pub struct SessionProbe {
    inner: Arc<ProbeInner>,
}

impl SessionProbe {
    pub fn created(&self) -> usize {
        self.inner.created.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    /// Session configs in creation order.
    pub fn configs(&self) -> Vec<SessionConfig> {
        self.inner
            .configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Prompts in send order.
    pub fn prompts(&self) -> Vec<String> {
        self.inner
            .prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait until at least `count` sessions were destroyed.
    pub async fn wait_for_destroy(&self, count: usize) {
        loop {
            let notified = self.inner.destroy_notify.notified();
            if self.destroyed() >= count {
                return;
            }
            notified.await;
        }
    }

    fn record_destroy(&self) {
        self.inner.destroyed.fetch_add(1, Ordering::SeqCst);
        self.inner.destroy_notify.notify_waiters();
    }
}

/// Client whose sessions replay `script` on every send.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    script: Vec<SessionEvent>,
    dispatch: Dispatch,
    fail_create: Option<String>,
    fail_send: Option<String>,
    probe: SessionProbe,
}

impl ScriptedClient {
    pub fn new(script: Vec<SessionEvent>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Make `create_session` fail with `message`.
    #[must_use]
    pub fn failing_create(mut self, message: impl Into<String>) -> Self {
        self.fail_create = Some(message.into());
        self
    }

    /// Make `send` fail with `message`.
    #[must_use]
    pub fn failing_send(mut self, message: impl Into<String>) -> Self {
        self.fail_send = Some(message.into());
        self
    }

    pub fn probe(&self) -> SessionProbe {
        self.probe.clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn create_session(&self, config: SessionConfig) -> Result<Box<dyn ChatSession>> {
        if let Some(message) = &self.fail_create {
            return Err(Error::SessionCreate(message.clone()));
        }
        self.probe
            .inner
            .configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(config);
        let n = self.probe.inner.created.fetch_add(1, Ordering::SeqCst) + 1;

        Ok(Box::new(ScriptedSession {
            session_id: format!("scripted-{n}"),
            script: self.script.clone(),
            dispatch: self.dispatch,
            fail_send: self.fail_send.clone(),
            handler: None,
            task: None,
            probe: self.probe.clone(),
            destroyed: false,
        }))
    }
}

struct ScriptedSession {
    session_id: String,
    script: Vec<SessionEvent>,
    dispatch: Dispatch,
    fail_send: Option<String>,
    handler: Option<EventHandler>,
    task: Option<JoinHandle<()>>,
    probe: SessionProbe,
    destroyed: bool,
}

#[async_trait]
impl ChatSession for ScriptedSession {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn on_event(&mut self, handler: EventHandler) {
        self.handler = Some(handler);
    }

    async fn send(&mut self, options: MessageOptions) -> Result<String> {
        if self.destroyed {
            return Err(Error::SessionClosed {
                session_id: self.session_id.clone(),
            });
        }
        self.probe
            .inner
            .prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(options.prompt);
        if let Some(message) = &self.fail_send {
            return Err(Error::Upstream {
                status: 503,
                message: message.clone(),
            });
        }

        let Some(handler) = self.handler.clone() else {
            return Ok(format!("{}-msg", self.session_id));
        };
        let script = self.script.clone();
        match self.dispatch {
            Dispatch::Inline => {
                for event in &script {
                    handler(event);
                }
            }
            Dispatch::Task => {
                self.task = Some(tokio::spawn(async move {
                    for event in &script {
                        tokio::task::yield_now().await;
                        handler(event);
                    }
                }));
            }
        }
        Ok(format!("{}-msg", self.session_id))
    }

    async fn destroy(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.handler = None;
        self.destroyed = true;
        self.probe.record_destroy();
        Ok(())
    }
}
