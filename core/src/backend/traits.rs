use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{BackendError, RenderError};
use crate::state::BackendEvent;

/// Sending half of one backend instance's event channel.
pub type BackendEventTx = mpsc::UnboundedSender<BackendEvent>;

/// Document sent alongside (or instead of) a text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub caption: String,
}

/// Session establishment, lifecycle events and send/lookup against the chat network.
///
/// `connect` returns once the session has been started; lifecycle events are
/// delivered on `events` for as long as the instance lives.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn name(&self) -> &str;
    async fn connect(&self, events: BackendEventTx) -> Result<(), BackendError>;
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), BackendError>;
    async fn send_attachment(
        &self,
        recipient: &str,
        attachment: Attachment,
    ) -> Result<(), BackendError>;
    async fn check_registered(&self, recipient: &str) -> Result<bool, BackendError>;
    async fn shutdown(&self) {}
}

/// Builds a fresh backend instance; called once at startup and once per reconnect.
pub trait BackendFactory: Send + Sync {
    fn create(&self) -> Result<Arc<dyn ChatBackend>, BackendError>;
}

/// Turns a raw pairing code into a displayable data URL.
pub trait PairingRenderer: Send + Sync {
    fn render(&self, code: &str) -> Result<String, RenderError>;
}
