use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    Connect,
    Request,
    Body,
    Unknown,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures raised by a chat backend while connecting, sending or looking up.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend {kind} error url={url}: {message}")]
    Transport {
        kind: TransportKind,
        url: String,
        message: String,
    },
    #[error("backend status={status} url={url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("failed to decode backend response url={url}: {message}")]
    Decode { url: String, message: String },
    #[error("backend rejected request: {0}")]
    Rejected(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend session closed")]
    Closed,
}

impl BackendError {
    /// Caller-facing description without gateway urls or instance names.
    pub fn public_message(&self) -> String {
        match self {
            Self::Transport { kind, .. } => format!("WhatsApp backend unreachable ({kind})"),
            Self::Status { status, body, .. } if body.is_empty() => {
                format!("WhatsApp backend returned status {status}")
            }
            Self::Status { status, body, .. } => {
                format!("WhatsApp backend returned status {status}: {body}")
            }
            Self::Decode { .. } => "WhatsApp backend sent an unreadable response".to_string(),
            Self::Rejected(message) => message.clone(),
            Self::Io(e) => e.to_string(),
            Self::Closed => "WhatsApp session closed".to_string(),
        }
    }
}
