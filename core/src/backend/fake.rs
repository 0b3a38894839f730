//! In-memory backend used by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{Attachment, BackendEventTx, BackendFactory, ChatBackend, PairingRenderer};
use crate::error::{BackendError, RenderError};
use crate::state::BackendEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sent {
    Text { to: String, body: String },
    Attachment { to: String, attachment: Attachment },
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub script: Vec<BackendEvent>,
    pub connect_error: bool,
    pub send_error: bool,
    pub lookup_error: bool,
    pub registered: bool,
    pub(crate) sent: Mutex<Vec<Sent>>,
    pub(crate) events: Mutex<Option<BackendEventTx>>,
    pub(crate) shutdowns: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            registered: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Pushes an event as if the chat network had produced it.
    pub fn emit(&self, event: BackendEvent) {
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            let _ = tx.send(event);
        }
    }

    /// Drops the event sender, closing the channel.
    pub fn hang_up(&self) {
        self.events.lock().unwrap().take();
    }

    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn connect(&self, events: BackendEventTx) -> Result<(), BackendError> {
        if self.connect_error {
            return Err(BackendError::Rejected("browser failed to launch".into()));
        }
        for event in &self.script {
            let _ = events.send(event.clone());
        }
        *self.events.lock().unwrap() = Some(events);
        Ok(())
    }

    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), BackendError> {
        tokio::task::yield_now().await;
        if self.send_error {
            return Err(BackendError::Rejected("chat not found".into()));
        }
        self.sent.lock().unwrap().push(Sent::Text {
            to: recipient.to_string(),
            body: text.to_string(),
        });
        Ok(())
    }

    async fn send_attachment(
        &self,
        recipient: &str,
        attachment: Attachment,
    ) -> Result<(), BackendError> {
        tokio::task::yield_now().await;
        if self.send_error {
            return Err(BackendError::Rejected("chat not found".into()));
        }
        self.sent.lock().unwrap().push(Sent::Attachment {
            to: recipient.to_string(),
            attachment,
        });
        Ok(())
    }

    async fn check_registered(&self, _recipient: &str) -> Result<bool, BackendError> {
        if self.lookup_error {
            return Err(BackendError::Closed);
        }
        Ok(self.registered)
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out one scripted `FakeBackend` per `create` call.
#[derive(Default)]
pub(crate) struct FakeFactory {
    pending: Mutex<VecDeque<FakeBackend>>,
    instances: Mutex<Vec<Arc<FakeBackend>>>,
    created: AtomicUsize,
}

impl FakeFactory {
    pub fn new(backends: Vec<FakeBackend>) -> Self {
        Self {
            pending: Mutex::new(backends.into()),
            ..Default::default()
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn instance(&self, idx: usize) -> Arc<FakeBackend> {
        self.instances.lock().unwrap()[idx].clone()
    }
}

impl BackendFactory for FakeFactory {
    fn create(&self) -> Result<Arc<dyn ChatBackend>, BackendError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let backend = Arc::new(
            self.pending
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(FakeBackend::new),
        );
        self.instances.lock().unwrap().push(backend.clone());
        Ok(backend)
    }
}

/// Renders `code` verbatim into a data URL; an empty code fails.
pub(crate) struct StubRenderer;

impl PairingRenderer for StubRenderer {
    fn render(&self, code: &str) -> Result<String, RenderError> {
        if code.is_empty() {
            return Err(RenderError("empty code".into()));
        }
        Ok(format!("data:image/png;base64,{code}"))
    }
}
