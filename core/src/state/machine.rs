//! 会话状态机

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, RwLock};

use super::transitions::{self, LoadingEffect, PairingEffect};
use super::types::{BackendEvent, LoadingProgress, PairingArtifact, SessionStatus, StatusChange};
use crate::backend::{PairingRenderer, ReconnectPolicy};
use crate::error::BackendError;

/// What the supervisor should do after an event has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Continue,
    /// Drop the current backend and construct a new one.
    Reconnect,
}

/// Point-in-time copy of the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub status: SessionStatus,
    pub last_change: DateTime<Utc>,
    pub pairing: Option<PairingArtifact>,
    pub loading: Option<LoadingProgress>,
}

impl SessionView {
    fn initial(now: DateTime<Utc>) -> Self {
        Self {
            status: SessionStatus::Initializing,
            last_change: now,
            pairing: None,
            loading: None,
        }
    }
}

/// Single authoritative owner of the session lifecycle.
///
/// Cloning yields another handle onto the same state. Only the supervisor
/// feeds events in; everything else reads.
#[derive(Clone)]
pub struct SessionStateMachine {
    inner: Arc<MachineInner>,
}

struct MachineInner {
    view: RwLock<SessionView>,
    policy: ReconnectPolicy,
    renderer: Arc<dyn PairingRenderer>,
    changes: broadcast::Sender<StatusChange>,
}

impl SessionStateMachine {
    pub fn new(policy: ReconnectPolicy, renderer: Arc<dyn PairingRenderer>) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(MachineInner {
                view: RwLock::new(SessionView::initial(Utc::now())),
                policy,
                renderer,
                changes,
            }),
        }
    }

    pub async fn status(&self) -> SessionStatus {
        self.inner.view.read().await.status
    }

    pub async fn view(&self) -> SessionView {
        self.inner.view.read().await.clone()
    }

    /// Subscribe to applied status changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.inner.changes.subscribe()
    }

    /// Applies one backend event and tells the caller whether to reconnect.
    pub async fn apply(&self, event: BackendEvent) -> Directive {
        // Render outside the lock. A failed render drops the artifact but keeps the status.
        let rendered = match &event {
            BackendEvent::PairingChallenge { code } => match self.inner.renderer.render(code) {
                Ok(data_url) => Some(data_url),
                Err(e) => {
                    tracing::error!(target: "chatbridge.session", error = %e, "pairing code could not be rendered");
                    self.inner.view.write().await.pairing = None;
                    return Directive::Continue;
                }
            },
            _ => None,
        };

        let now = Utc::now();
        let mut view = self.inner.view.write().await;

        let Some(plan) = transitions::plan(view.status, &event, self.inner.policy) else {
            tracing::debug!(
                target: "chatbridge.session",
                status = %view.status,
                event = event.kind(),
                "event ignored"
            );
            return Directive::Continue;
        };

        match plan.pairing {
            PairingEffect::Install => {
                view.pairing = rendered.map(|data_url| PairingArtifact {
                    data_url,
                    created_at: now,
                });
            }
            PairingEffect::Clear => view.pairing = None,
        }

        match plan.loading {
            LoadingEffect::Keep => {}
            LoadingEffect::Update { percent, message } => {
                let since = view.loading.as_ref().map(|l| l.since).unwrap_or(now);
                tracing::info!(
                    target: "chatbridge.session",
                    percent = ?percent,
                    message = ?message,
                    "loading"
                );
                view.loading = Some(LoadingProgress {
                    percent,
                    message,
                    since,
                });
            }
            LoadingEffect::Clear => view.loading = None,
        }

        match &event {
            BackendEvent::AuthFailure { message } => {
                tracing::error!(target: "chatbridge.session", message = %message, "authentication failed");
            }
            BackendEvent::Disconnected { reason } => {
                tracing::warn!(
                    target: "chatbridge.session",
                    reason = %reason.as_ref().map(|r| r.to_string()).unwrap_or_else(|| "none".into()),
                    reconnect = plan.reconnect,
                    "session disconnected"
                );
            }
            _ => {}
        }

        Self::set_status(&mut view, plan.next, now, &self.inner.changes);

        if plan.reconnect {
            Directive::Reconnect
        } else {
            Directive::Continue
        }
    }

    /// Backend construction or connect failed; the session is dead for this process.
    pub async fn fail_initialization(&self, err: &BackendError) {
        tracing::error!(target: "chatbridge.session", error = %err, "initialization failed");
        let mut view = self.inner.view.write().await;
        view.pairing = None;
        Self::set_status(&mut view, SessionStatus::Error, Utc::now(), &self.inner.changes);
    }

    fn set_status(
        view: &mut SessionView,
        next: SessionStatus,
        now: DateTime<Utc>,
        changes: &broadcast::Sender<StatusChange>,
    ) {
        if view.status == next {
            return;
        }
        let from = view.status;
        view.status = next;
        view.last_change = now;
        tracing::info!(target: "chatbridge.session", status = %next, "status changed");
        let _ = changes.send(StatusChange {
            from,
            to: next,
            at: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::StubRenderer;
    use crate::state::DisconnectReason;
    use pretty_assertions::assert_eq;

    fn machine(policy: ReconnectPolicy) -> SessionStateMachine {
        SessionStateMachine::new(policy, Arc::new(StubRenderer))
    }

    fn pairing(code: &str) -> BackendEvent {
        BackendEvent::PairingChallenge { code: code.into() }
    }

    async fn assert_pairing_iff_qr(m: &SessionStateMachine) {
        let view = m.view().await;
        assert_eq!(
            view.pairing.is_some(),
            view.status == SessionStatus::Qr,
            "status {}",
            view.status
        );
    }

    #[tokio::test]
    async fn starts_initializing() {
        let m = machine(ReconnectPolicy::Automatic);
        let view = m.view().await;
        assert_eq!(view.status, SessionStatus::Initializing);
        assert!(view.pairing.is_none());
        assert!(view.loading.is_none());
    }

    #[tokio::test]
    async fn pairing_then_ready_clears_artifact() {
        let m = machine(ReconnectPolicy::Automatic);

        m.apply(pairing("2@abc")).await;
        let view = m.view().await;
        assert_eq!(view.status, SessionStatus::Qr);
        assert_eq!(
            view.pairing.map(|p| p.data_url),
            Some("data:image/png;base64,2@abc".to_string())
        );

        m.apply(BackendEvent::Ready).await;
        let view = m.view().await;
        assert_eq!(view.status, SessionStatus::Ready);
        assert!(view.pairing.is_none());
    }

    #[tokio::test]
    async fn artifact_present_only_in_qr() {
        let m = machine(ReconnectPolicy::Manual);
        let events = [
            pairing("a"),
            BackendEvent::Authenticated,
            pairing("b"),
            BackendEvent::Loading {
                percent: Some(5),
                message: None,
            },
            pairing("c"),
            BackendEvent::Disconnected { reason: None },
            pairing("d"),
            BackendEvent::AuthFailure {
                message: "x".into(),
            },
            pairing("e"),
            BackendEvent::Ready,
            BackendEvent::Disconnected {
                reason: Some(DisconnectReason::LoggedOut),
            },
        ];
        for event in events {
            m.apply(event).await;
            assert_pairing_iff_qr(&m).await;
        }
    }

    #[tokio::test]
    async fn render_failure_leaves_state_untouched() {
        let m = machine(ReconnectPolicy::Automatic);
        let before = m.view().await;

        assert_eq!(m.apply(pairing("")).await, Directive::Continue);
        assert_eq!(m.view().await, before);
    }

    #[tokio::test]
    async fn render_failure_drops_previous_artifact() {
        let m = machine(ReconnectPolicy::Automatic);
        m.apply(pairing("old")).await;
        let before = m.view().await;
        assert!(before.pairing.is_some());

        assert_eq!(m.apply(pairing("")).await, Directive::Continue);
        let after = m.view().await;
        assert_eq!(after.status, SessionStatus::Qr);
        assert_eq!(after.last_change, before.last_change);
        assert!(after.pairing.is_none());
    }

    #[tokio::test]
    async fn repeated_status_keeps_timestamp() {
        let m = machine(ReconnectPolicy::Automatic);
        let mut rx = m.subscribe();

        m.apply(BackendEvent::Ready).await;
        let first = m.view().await.last_change;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        m.apply(BackendEvent::Ready).await;

        assert_eq!(m.view().await.last_change, first);
        let change = rx.recv().await.unwrap();
        assert_eq!(change.from, SessionStatus::Initializing);
        assert_eq!(change.to, SessionStatus::Ready);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn loading_keeps_first_since_and_latest_progress() {
        let m = machine(ReconnectPolicy::Automatic);

        m.apply(BackendEvent::Loading {
            percent: Some(10),
            message: Some("WhatsApp".into()),
        })
        .await;
        let since = m.view().await.loading.unwrap().since;

        m.apply(BackendEvent::Loading {
            percent: Some(80),
            message: Some("Syncing".into()),
        })
        .await;
        let loading = m.view().await.loading.unwrap();
        assert_eq!(loading.since, since);
        assert_eq!(loading.percent, Some(80));
        assert_eq!(loading.message.as_deref(), Some("Syncing"));

        m.apply(BackendEvent::Ready).await;
        assert!(m.view().await.loading.is_none());
    }

    #[tokio::test]
    async fn disconnect_directive_follows_policy() {
        let auto = machine(ReconnectPolicy::Automatic);
        let directive = auto
            .apply(BackendEvent::Disconnected {
                reason: Some(DisconnectReason::Other("408".into())),
            })
            .await;
        assert_eq!(directive, Directive::Reconnect);
        assert_eq!(auto.status().await, SessionStatus::Disconnected);

        let manual = machine(ReconnectPolicy::Manual);
        let directive = manual
            .apply(BackendEvent::Disconnected {
                reason: Some(DisconnectReason::Other("408".into())),
            })
            .await;
        assert_eq!(directive, Directive::Continue);
        assert_eq!(manual.status().await, SessionStatus::Disconnected);
    }

    #[tokio::test]
    async fn logged_out_settles_without_reconnect() {
        let m = machine(ReconnectPolicy::Automatic);
        m.apply(pairing("a")).await;
        let directive = m
            .apply(BackendEvent::Disconnected {
                reason: Some(DisconnectReason::LoggedOut),
            })
            .await;
        assert_eq!(directive, Directive::Continue);
        assert_eq!(m.status().await, SessionStatus::LoggedOut);
        assert!(m.view().await.pairing.is_none());
    }

    #[tokio::test]
    async fn initialization_failure_is_terminal() {
        let m = machine(ReconnectPolicy::Automatic);
        m.fail_initialization(&BackendError::Closed).await;
        assert_eq!(m.status().await, SessionStatus::Error);

        m.apply(BackendEvent::Ready).await;
        assert_eq!(m.status().await, SessionStatus::Error);
    }
}
