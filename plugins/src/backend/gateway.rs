//! 通过 REST 网关驱动的 WhatsApp 会话

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chatbridge_core::api::{
    Attachment, BackendError, BackendEvent, BackendEventTx, BackendFlavor, ChatBackend,
    DisconnectReason, GatewayConfig,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::http::GatewayClient;

/// Connection state as reported by `GET /instance/connectionState/{instance}`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ConnectionState {
    state: String,
    status_reason: Option<u16>,
}

impl ConnectionState {
    fn from_value(v: &Value) -> Self {
        let state = v["instance"]["state"]
            .as_str()
            .or_else(|| v["state"].as_str())
            .unwrap_or("")
            .to_string();
        let status_reason = v["instance"]["statusReason"]
            .as_u64()
            .or_else(|| v["statusReason"].as_u64())
            .and_then(|code| u16::try_from(code).ok());
        Self {
            state,
            status_reason,
        }
    }
}

fn pairing_code(v: &Value) -> Option<String> {
    v["code"]
        .as_str()
        .or_else(|| v["qrcode"]["code"].as_str())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

enum Step {
    Continue(Vec<BackendEvent>),
    /// The session is gone; emit these and stop polling.
    Finish(Vec<BackendEvent>),
}

/// Turns successive polled states into lifecycle events, each at most once.
#[derive(Debug, Default)]
struct Tracker {
    code: Option<String>,
    open: bool,
    refused: bool,
}

impl Tracker {
    fn needs_code(&self, state: &ConnectionState) -> bool {
        !self.open && state.state == "connecting"
    }

    fn on_code(&mut self, code: String) -> Option<BackendEvent> {
        if self.code.as_deref() == Some(code.as_str()) {
            return None;
        }
        self.code = Some(code.clone());
        Some(BackendEvent::PairingChallenge { code })
    }

    fn on_state(&mut self, state: &ConnectionState) -> Step {
        match state.state.as_str() {
            "open" | "connected" if !self.open => {
                self.open = true;
                self.code = None;
                Step::Continue(vec![BackendEvent::Authenticated, BackendEvent::Ready])
            }
            "open" | "connected" => Step::Continue(Vec::new()),
            "connecting" if self.open => Step::Finish(vec![BackendEvent::Disconnected {
                reason: Some(DisconnectReason::Other("connection lost".into())),
            }]),
            "connecting" => Step::Continue(Vec::new()),
            _ if is_closed(state) => {
                let reason = state
                    .status_reason
                    .map(DisconnectReason::from_status_code)
                    .unwrap_or_else(|| DisconnectReason::Other("close".into()));
                Step::Finish(vec![BackendEvent::Disconnected {
                    reason: Some(reason),
                }])
            }
            "refused" if !self.refused => {
                self.refused = true;
                Step::Continue(vec![BackendEvent::AuthFailure {
                    message: "pairing refused by WhatsApp".into(),
                }])
            }
            other => {
                tracing::debug!(target: "chatbridge.gateway", state = %other, "connection state unchanged");
                Step::Continue(Vec::new())
            }
        }
    }
}

fn emit(events: &BackendEventTx, batch: Vec<BackendEvent>) -> bool {
    batch.into_iter().all(|event| events.send(event).is_ok())
}

fn is_closed(state: &ConnectionState) -> bool {
    matches!(state.state.as_str(), "close" | "closed")
}

async fn poll_session(
    client: GatewayClient,
    instance: String,
    interval: Duration,
    mut tracker: Tracker,
    events: BackendEventTx,
) {
    let state_path = format!("/instance/connectionState/{instance}");
    let connect_path = format!("/instance/connect/{instance}");
    // First poll waits one interval so a just-restarted session can leave `close`.
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);

    loop {
        ticker.tick().await;

        let state = match client.get(&state_path).await {
            Ok(v) => ConnectionState::from_value(&v),
            Err(BackendError::Status { status: 404, .. }) => {
                let _ = events.send(BackendEvent::Disconnected {
                    reason: Some(DisconnectReason::Other("instance not found".into())),
                });
                return;
            }
            Err(e) => {
                tracing::warn!(target: "chatbridge.gateway", error = %e, "connection check failed");
                continue;
            }
        };

        if tracker.needs_code(&state) {
            match client.get(&connect_path).await {
                Ok(v) => {
                    if let Some(event) = pairing_code(&v).and_then(|c| tracker.on_code(c)) {
                        if events.send(event).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "chatbridge.gateway", error = %e, "pairing code fetch failed");
                }
            }
        }

        match tracker.on_state(&state) {
            Step::Continue(batch) => {
                if !emit(&events, batch) {
                    return;
                }
            }
            Step::Finish(batch) => {
                emit(&events, batch);
                return;
            }
        }
    }
}

/// One WhatsApp session hosted by an external REST gateway.
///
/// Lifecycle events come from polling the gateway's connection state; sends
/// and lookups are plain request/response calls.
pub struct GatewayBackend {
    client: GatewayClient,
    flavor: BackendFlavor,
    instance: String,
    poll_interval: Duration,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl GatewayBackend {
    pub fn new(cfg: &GatewayConfig, flavor: BackendFlavor) -> Result<Self, BackendError> {
        let client = GatewayClient::new(&cfg.base_url, cfg.api_key.clone(), cfg.timeout_ms)?;
        Ok(Self {
            client,
            flavor,
            instance: cfg.instance.clone(),
            poll_interval: Duration::from_millis(cfg.poll_interval_ms.max(1)),
            poller: Mutex::new(None),
        })
    }

    /// Returns true when the instance already existed on the gateway.
    async fn ensure_instance(&self) -> Result<bool, BackendError> {
        let body = json!({
            "instanceName": self.instance,
            "qrcode": true,
            "integration": "WHATSAPP-BAILEYS",
        });
        match self.client.post("/instance/create", &body).await {
            Ok(_) => {
                tracing::info!(target: "chatbridge.gateway", instance = %self.instance, "instance created");
                Ok(false)
            }
            Err(BackendError::Status { status, ref body, .. })
                if status == 403 || status == 409 || body.to_lowercase().contains("already") =>
            {
                tracing::info!(target: "chatbridge.gateway", instance = %self.instance, "instance exists, reusing");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Restarts a reused instance whose session is closed. Yields the fresh pairing code, if any.
    async fn restart_if_closed(&self) -> Result<Option<String>, BackendError> {
        let state = ConnectionState::from_value(
            &self
                .client
                .get(&format!("/instance/connectionState/{}", self.instance))
                .await?,
        );
        if !is_closed(&state) {
            return Ok(None);
        }
        tracing::info!(target: "chatbridge.gateway", instance = %self.instance, "restarting closed session");
        let v = self
            .client
            .get(&format!("/instance/connect/{}", self.instance))
            .await?;
        Ok(pairing_code(&v))
    }
}

#[async_trait]
impl ChatBackend for GatewayBackend {
    fn name(&self) -> &str {
        self.flavor.as_str()
    }

    async fn connect(&self, events: BackendEventTx) -> Result<(), BackendError> {
        let mut tracker = Tracker::default();
        if self.ensure_instance().await? {
            let restarted = self.restart_if_closed().await?;
            if let Some(event) = restarted.and_then(|code| tracker.on_code(code)) {
                events.send(event).map_err(|_| BackendError::Closed)?;
            }
        }

        let handle = tokio::spawn(poll_session(
            self.client.clone(),
            self.instance.clone(),
            self.poll_interval,
            tracker,
            events,
        ));
        if let Some(previous) = self.poller.lock().await.replace(handle) {
            previous.abort();
        }
        Ok(())
    }

    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), BackendError> {
        let body = json!({
            "number": self.flavor.chat_address(recipient),
            "text": text,
        });
        self.client
            .post(&format!("/message/sendText/{}", self.instance), &body)
            .await?;
        Ok(())
    }

    async fn send_attachment(
        &self,
        recipient: &str,
        attachment: Attachment,
    ) -> Result<(), BackendError> {
        let body = json!({
            "number": self.flavor.chat_address(recipient),
            "mediatype": "document",
            "mimetype": attachment.mime_type,
            "media": base64::engine::general_purpose::STANDARD.encode(&attachment.bytes),
            "fileName": attachment.file_name,
            "caption": attachment.caption,
        });
        self.client
            .post(&format!("/message/sendMedia/{}", self.instance), &body)
            .await?;
        Ok(())
    }

    async fn check_registered(&self, recipient: &str) -> Result<bool, BackendError> {
        let path = format!("/chat/whatsappNumbers/{}", self.instance);
        let v = self
            .client
            .post(
                &path,
                &json!({ "numbers": [self.flavor.chat_address(recipient)] }),
            )
            .await?;
        let entries = v.as_array().ok_or_else(|| BackendError::Decode {
            url: path.clone(),
            message: "expected an array of lookup results".into(),
        })?;
        Ok(entries
            .first()
            .and_then(|e| e["exists"].as_bool())
            .unwrap_or(false))
    }

    async fn shutdown(&self) {
        if let Some(handle) = self.poller.lock().await.take() {
            handle.abort();
        }
    }
}
