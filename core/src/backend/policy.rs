use serde::{Deserialize, Serialize};

use crate::state::DisconnectReason;

/// Whether a dropped session is re-established by constructing a new backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Reconnect on any disconnect except an explicit logout.
    Automatic,
    /// Never reconnect; an operator restarts the process.
    Manual,
}

impl ReconnectPolicy {
    pub fn should_reconnect(self, reason: Option<&DisconnectReason>) -> bool {
        match self {
            Self::Automatic => !matches!(reason, Some(DisconnectReason::LoggedOut)),
            Self::Manual => false,
        }
    }
}
