//! 状态转换规则

use super::types::{BackendEvent, DisconnectReason, SessionStatus};
use crate::backend::ReconnectPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingEffect {
    /// Install the freshly rendered artifact.
    Install,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadingEffect {
    Keep,
    /// Store progress; start the loading clock if it is not running.
    Update {
        percent: Option<u32>,
        message: Option<String>,
    },
    Clear,
}

/// What the state machine must do in response to one backend event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub next: SessionStatus,
    pub pairing: PairingEffect,
    pub loading: LoadingEffect,
    pub reconnect: bool,
}

impl TransitionPlan {
    fn to(next: SessionStatus) -> Self {
        Self {
            next,
            pairing: PairingEffect::Clear,
            loading: LoadingEffect::Keep,
            reconnect: false,
        }
    }
}

/// Transition rules. Returns `None` when the event must be ignored.
pub fn plan(
    current: SessionStatus,
    event: &BackendEvent,
    policy: ReconnectPolicy,
) -> Option<TransitionPlan> {
    if current.is_terminal() {
        return None;
    }

    let plan = match event {
        BackendEvent::PairingChallenge { .. } => TransitionPlan {
            pairing: PairingEffect::Install,
            ..TransitionPlan::to(SessionStatus::Qr)
        },
        BackendEvent::Authenticated => TransitionPlan::to(SessionStatus::Authenticated),
        BackendEvent::Ready => TransitionPlan {
            loading: LoadingEffect::Clear,
            ..TransitionPlan::to(SessionStatus::Ready)
        },
        BackendEvent::Loading { percent, message } => TransitionPlan {
            loading: LoadingEffect::Update {
                percent: *percent,
                message: message.clone(),
            },
            ..TransitionPlan::to(SessionStatus::Loading)
        },
        BackendEvent::AuthFailure { .. } => TransitionPlan::to(SessionStatus::Failure),
        BackendEvent::Disconnected {
            reason: Some(DisconnectReason::LoggedOut),
        } => TransitionPlan::to(SessionStatus::LoggedOut),
        BackendEvent::Disconnected { reason } => TransitionPlan {
            reconnect: policy.should_reconnect(reason.as_ref()),
            ..TransitionPlan::to(SessionStatus::Disconnected)
        },
    };

    Some(plan)
}
