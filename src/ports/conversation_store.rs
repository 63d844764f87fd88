//! Conversation store port.
//!
//! Durable, per-session, append-only log of turns. Insertion order is the only
//! ordering guarantee; turns are never edited once appended.

use async_trait::async_trait;

use crate::domain::conversation::{SessionSummary, Turn, TurnHistory};
use crate::domain::foundation::SessionId;

/// Errors surfaced by conversation store implementations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Backend temporarily unreachable. Safe to retry.
    #[error("conversation store unavailable: {0}")]
    Unavailable(String),

    /// Stored data for the session cannot be read back consistently.
    #[error("conversation for session {session} is corrupted: {reason}")]
    Corrupted { session: SessionId, reason: String },

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Result of clearing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearOutcome {
    /// Number of turns removed.
    pub removed: usize,
    /// Whether the welcome turn was inserted after clearing.
    pub welcome_seeded: bool,
}

/// Port for the conversation log.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Returns the session record, creating it when the store has none.
    ///
    /// `is_new` on the summary tells the caller which case happened.
    async fn open_session(&self, session: &SessionId) -> Result<SessionSummary, StoreError>;

    /// Returns the session record without creating it.
    async fn find_session(&self, session: &SessionId) -> Result<Option<SessionSummary>, StoreError>;

    /// Appends a turn at the end of the session log and bumps last activity.
    ///
    /// Creates the session record if it does not exist yet.
    async fn append(&self, session: &SessionId, turn: &Turn) -> Result<(), StoreError>;

    /// The most recent `limit` turns, oldest first.
    ///
    /// Unknown sessions yield an empty history.
    async fn history(&self, session: &SessionId, limit: usize) -> Result<TurnHistory, StoreError>;

    /// Removes every turn of the session, then inserts `welcome` if given.
    ///
    /// Both steps happen atomically with respect to other calls on the same
    /// session.
    async fn clear(&self, session: &SessionId, welcome: Option<&Turn>) -> Result<ClearOutcome, StoreError>;
}
