//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `chatbridge_core::api` instead of reaching into internal modules.

pub use crate::backend::{
    Attachment, BackendEventTx, BackendFactory, BackendSlot, ChatBackend, PairingRenderer,
    ReconnectPolicy,
};
pub use crate::config::{
    apply_env_overrides, load_default, load_from_path, AppConfig, BackendConfig, BackendFlavor,
    DispatchConfig, GatewayConfig, HttpServerConfig, LoggingConfig, PairingConfig, SessionConfig,
};
pub use crate::dispatch::{DispatchGate, DispatchOutcome, ProcessedMessages, SendRequest};
pub use crate::error::{BackendError, CliError, GateError, RenderError, TransportKind};
pub use crate::session::SessionSupervisor;
pub use crate::state::{
    BackendEvent, DisconnectReason, HealthReporter, HealthSnapshot, PairingSnapshot,
    SessionStateMachine, SessionStatus, StatusChange, LOGGED_OUT_CODE,
};
