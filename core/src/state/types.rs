//! 会话状态类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status code the chat network uses for an explicit logout.
pub const LOGGED_OUT_CODE: u16 = 401;

/// Lifecycle status of the chat session. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Initializing,
    Qr,
    Authenticated,
    Loading,
    Ready,
    Disconnected,
    LoggedOut,
    Failure,
    Error,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Qr => "qr",
            Self::Authenticated => "authenticated",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Disconnected => "disconnected",
            Self::LoggedOut => "logged_out",
            Self::Failure => "failure",
            Self::Error => "error",
        }
    }

    /// No backend event moves the session out of this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the backend dropped the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    LoggedOut,
    Other(String),
}

impl DisconnectReason {
    pub fn from_status_code(code: u16) -> Self {
        if code == LOGGED_OUT_CODE {
            Self::LoggedOut
        } else {
            Self::Other(code.to_string())
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggedOut => f.write_str("logged_out"),
            Self::Other(reason) => f.write_str(reason),
        }
    }
}

/// Lifecycle events a chat backend emits on its event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// A new pairing code must be presented to link the account.
    PairingChallenge { code: String },
    Authenticated,
    Ready,
    Loading {
        percent: Option<u32>,
        message: Option<String>,
    },
    AuthFailure { message: String },
    Disconnected { reason: Option<DisconnectReason> },
}

impl BackendEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PairingChallenge { .. } => "pairing",
            Self::Authenticated => "authenticated",
            Self::Ready => "ready",
            Self::Loading { .. } => "loading",
            Self::AuthFailure { .. } => "auth_failure",
            Self::Disconnected { .. } => "disconnected",
        }
    }
}

/// Rendered pairing code, ready to be shown to a human.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingArtifact {
    /// `data:image/png;base64,...`
    pub data_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingProgress {
    pub percent: Option<u32>,
    pub message: Option<String>,
    /// First loading event of the current loading phase.
    pub since: DateTime<Utc>,
}

/// Published on every applied status change.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub from: SessionStatus,
    pub to: SessionStatus,
    pub at: DateTime<Utc>,
}
