//! In-Memory Conversation Store Adapter
//!
//! Keeps every session's turns in process memory. History survives
//! reconnection but not restarts. Also used by tests, with switches to
//! simulate an unavailable backend.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::{Role, SessionSummary, Turn, TurnHistory};
use crate::domain::foundation::{SessionId, Timestamp};
use crate::ports::{ClearOutcome, ConversationStore, StoreError};

#[derive(Debug, Clone)]
struct SessionRecord {
    created_at: Timestamp,
    last_activity_at: Timestamp,
    turns: Vec<Turn>,
}

impl SessionRecord {
    fn new() -> Self {
        let now = Timestamp::now();
        Self {
            created_at: now,
            last_activity_at: now,
            turns: Vec::new(),
        }
    }

    fn summary(&self, id: &SessionId, is_new: bool) -> SessionSummary {
        SessionSummary {
            id: id.clone(),
            is_new,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
            turn_count: self.turns.len(),
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    unavailable: bool,
    failing_roles: HashSet<Role>,
}

/// In-memory conversation log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionRecord>>>,
    faults: Arc<std::sync::Mutex<Faults>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail with `Unavailable` until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.unavailable = unavailable;
        }
    }

    /// Makes appends of turns with the given role fail with `Unavailable`.
    pub fn fail_appends_of(&self, role: Role) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.failing_roles.insert(role);
        }
    }

    /// Number of sessions the store knows about.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        match self.faults.lock() {
            Ok(faults) if faults.unavailable => {
                Err(StoreError::Unavailable("store switched off".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn check_append(&self, turn: &Turn) -> Result<(), StoreError> {
        self.check_available()?;
        match self.faults.lock() {
            Ok(faults) if faults.failing_roles.contains(&turn.role()) => Err(
                StoreError::Unavailable(format!("appends of {} turns are failing", turn.role())),
            ),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn open_session(&self, session: &SessionId) -> Result<SessionSummary, StoreError> {
        self.check_available()?;
        let mut sessions = self.sessions.write().await;
        match sessions.get(session) {
            Some(record) => Ok(record.summary(session, false)),
            None => {
                let record = SessionRecord::new();
                let summary = record.summary(session, true);
                sessions.insert(session.clone(), record);
                Ok(summary)
            }
        }
    }

    async fn find_session(&self, session: &SessionId) -> Result<Option<SessionSummary>, StoreError> {
        self.check_available()?;
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session).map(|r| r.summary(session, false)))
    }

    async fn append(&self, session: &SessionId, turn: &Turn) -> Result<(), StoreError> {
        self.check_append(turn)?;
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .entry(session.clone())
            .or_insert_with(SessionRecord::new);
        record.turns.push(turn.clone());
        record.last_activity_at = Timestamp::now();
        Ok(())
    }

    async fn history(&self, session: &SessionId, limit: usize) -> Result<TurnHistory, StoreError> {
        self.check_available()?;
        let sessions = self.sessions.read().await;
        let turns = match sessions.get(session) {
            Some(record) => {
                let start = record.turns.len().saturating_sub(limit);
                record.turns[start..].to_vec()
            }
            None => Vec::new(),
        };
        Ok(TurnHistory::new(turns))
    }

    async fn clear(&self, session: &SessionId, welcome: Option<&Turn>) -> Result<ClearOutcome, StoreError> {
        self.check_available()?;
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .entry(session.clone())
            .or_insert_with(SessionRecord::new);
        let removed = record.turns.len();
        record.turns.clear();
        if let Some(welcome) = welcome {
            record.turns.push(welcome.clone());
        }
        record.last_activity_at = Timestamp::now();
        Ok(ClearOutcome {
            removed,
            welcome_seeded: welcome.is_some(),
        })
    }
}
