//! 健康与配对快照

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::machine::{SessionStateMachine, SessionView};
use super::types::SessionStatus;

/// Read-only health projection, recomputed per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub whatsapp_status: SessionStatus,
    /// Epoch milliseconds of the last applied transition.
    pub last_state_change: i64,
    /// Milliseconds since the last applied transition.
    pub state_age_ms: i64,
    /// Milliseconds spent loading, 0 when not loading.
    pub loading_duration: i64,
    pub loading_percent: Option<u32>,
    pub loading_message: Option<String>,
    pub qr_available: bool,
    pub server_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairingSnapshot {
    pub status: SessionStatus,
    pub qr: Option<String>,
    pub timestamp: String,
}

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl SessionView {
    pub fn health_at(&self, now: DateTime<Utc>) -> HealthSnapshot {
        let loading_duration = self
            .loading
            .as_ref()
            .map(|l| (now - l.since).num_milliseconds().max(0))
            .unwrap_or(0);

        HealthSnapshot {
            whatsapp_status: self.status,
            last_state_change: self.last_change.timestamp_millis(),
            state_age_ms: (now - self.last_change).num_milliseconds().max(0),
            loading_duration,
            loading_percent: self.loading.as_ref().and_then(|l| l.percent),
            loading_message: self.loading.as_ref().and_then(|l| l.message.clone()),
            qr_available: self.pairing.is_some(),
            server_time: iso(now),
        }
    }

    pub fn pairing_at(&self, now: DateTime<Utc>) -> PairingSnapshot {
        PairingSnapshot {
            status: self.status,
            qr: self.pairing.as_ref().map(|p| p.data_url.clone()),
            timestamp: iso(now),
        }
    }
}

/// Derives health and pairing snapshots for external polling.
#[derive(Clone)]
pub struct HealthReporter {
    machine: SessionStateMachine,
}

impl HealthReporter {
    pub fn new(machine: SessionStateMachine) -> Self {
        Self { machine }
    }

    pub async fn health(&self) -> HealthSnapshot {
        self.machine.view().await.health_at(Utc::now())
    }

    pub async fn pairing(&self) -> PairingSnapshot {
        self.machine.view().await.pairing_at(Utc::now())
    }
}
