//! Session lifecycle as seen by the gateway.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{SessionId, StateMachine, Timestamp, ValidationError};

/// Why a session connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    IdleTimeout,
    ClientClosed,
    /// A newer connection took over the same session id.
    Superseded,
    ServerShutdown,
}

/// Connection state of a session.
///
/// `Connecting -> Active -> Closed`. A connection that fails during setup
/// may go straight from `Connecting` to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum SessionState {
    Connecting,
    Active,
    Closed(CloseReason),
}

impl SessionState {
    /// Moves to `Closed` with the given reason, validating the transition.
    pub fn close(&self, reason: CloseReason) -> Result<Self, ValidationError> {
        self.transition_to(SessionState::Closed(reason))
    }
}

impl StateMachine for SessionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionState::*;
        matches!(
            (self, target),
            (Connecting, Active) | (Connecting, Closed(_)) | (Active, Closed(_))
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Active => write!(f, "active"),
            SessionState::Closed(reason) => write!(f, "closed ({:?})", reason),
        }
    }
}

/// What the conversation store knows about a session when it is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    /// True when the store had no record and created one.
    pub is_new: bool,
    pub created_at: Timestamp,
    pub last_activity_at: Timestamp,
    pub turn_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    const REASONS: [CloseReason; 4] = [
        CloseReason::IdleTimeout,
        CloseReason::ClientClosed,
        CloseReason::Superseded,
        CloseReason::ServerShutdown,
    ];

    #[test]
    fn connecting_becomes_active() {
        let state = SessionState::Connecting.transition_to(SessionState::Active).unwrap();
        assert_eq!(state, SessionState::Active);
    }

    #[test]
    fn active_closes_for_any_reason() {
        for reason in REASONS {
            assert_eq!(
                SessionState::Active.close(reason).unwrap(),
                SessionState::Closed(reason)
            );
        }
    }

    #[test]
    fn failed_setup_closes_from_connecting() {
        assert!(SessionState::Connecting.close(CloseReason::ServerShutdown).is_ok());
    }

    #[test]
    fn closed_goes_nowhere() {
        let closed = SessionState::Closed(CloseReason::ClientClosed);
        assert!(closed.transition_to(SessionState::Active).is_err());
        for reason in REASONS {
            assert!(closed.close(reason).is_err());
        }
    }

    #[test]
    fn active_cannot_go_back_to_connecting() {
        let err = SessionState::Active
            .transition_to(SessionState::Connecting)
            .unwrap_err();
        assert!(err.to_string().contains("state"));
    }
}
