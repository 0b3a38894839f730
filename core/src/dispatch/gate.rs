use std::path::Path;
use std::sync::Arc;

use super::processed::ProcessedMessages;
use super::types::{DispatchOutcome, SendRequest};
use crate::backend::{Attachment, BackendSlot, ChatBackend};
use crate::error::{BackendError, GateError};
use crate::state::{SessionStateMachine, SessionStatus};

const DOCUMENT_MIME_TYPE: &str = "application/pdf";

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// At-most-once outbound sends keyed by the caller's logical message id.
#[derive(Clone)]
pub struct DispatchGate {
    machine: SessionStateMachine,
    backend: BackendSlot,
    processed: Arc<ProcessedMessages>,
}

impl DispatchGate {
    pub fn new(
        machine: SessionStateMachine,
        backend: BackendSlot,
        processed: Arc<ProcessedMessages>,
    ) -> Self {
        Self {
            machine,
            backend,
            processed,
        }
    }

    async fn ready_backend(&self) -> Result<Arc<dyn ChatBackend>, GateError> {
        let current = self.machine.status().await;
        if current != SessionStatus::Ready {
            return Err(GateError::NotReady { current });
        }
        // A ready session always has an installed backend; treat a gap like not-ready.
        self.backend
            .current()
            .await
            .ok_or(GateError::NotReady { current })
    }

    /// Sends text and/or a document for one logical message.
    ///
    /// The id is recorded before anything is sent: a retry after a failed or
    /// interrupted send is reported as a duplicate rather than sent twice.
    pub async fn dispatch(&self, req: SendRequest) -> Result<DispatchOutcome, GateError> {
        let backend = self.ready_backend().await?;

        let message_id =
            present(req.message_id).ok_or(GateError::MissingField { field: "messageId" })?;

        if !self.processed.try_mark(&message_id).await {
            tracing::info!(target: "chatbridge.dispatch", message_id = %message_id, "duplicate message skipped");
            return Ok(DispatchOutcome::Duplicate);
        }

        let recipient = present(req.recipient).ok_or(GateError::MissingField { field: "number" })?;

        if let Some(text) = present(req.text) {
            backend
                .send_text(&recipient, &text)
                .await
                .map_err(|e| send_failure(&message_id, &e))?;
        }

        if let Some(path) = present(req.attachment_path) {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| {
                    let e = std::io::Error::new(e.kind(), format!("{path}: {e}"));
                    send_failure(&message_id, &BackendError::Io(e))
                })?;
            let file_name = Path::new(&path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.clone());
            let attachment = Attachment {
                file_name,
                mime_type: DOCUMENT_MIME_TYPE.to_string(),
                bytes,
                caption: req.caption.unwrap_or_default(),
            };
            backend
                .send_attachment(&recipient, attachment)
                .await
                .map_err(|e| send_failure(&message_id, &e))?;
        }

        tracing::info!(target: "chatbridge.dispatch", message_id = %message_id, "message sent");
        Ok(DispatchOutcome::Sent)
    }

    /// Registration lookup for a recipient number.
    pub async fn check_number(&self, number: Option<String>) -> Result<(), GateError> {
        let backend = self.ready_backend().await?;
        let number = present(number).ok_or(GateError::MissingField { field: "number" })?;

        match backend.check_registered(&number).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(GateError::NotRegistered),
            Err(e) => {
                tracing::warn!(target: "chatbridge.dispatch", error = %e, "number lookup failed");
                Err(GateError::LookupFailure(e.public_message()))
            }
        }
    }

    /// Rejects with the current status unless the session is ready.
    pub async fn ensure_ready(&self) -> Result<(), GateError> {
        self.ready_backend().await.map(|_| ())
    }
}

fn send_failure(message_id: &str, err: &BackendError) -> GateError {
    tracing::error!(target: "chatbridge.dispatch", message_id = %message_id, error = %err, "send failed");
    GateError::SendFailure(err.public_message())
}
