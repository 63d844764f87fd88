//! ClearSession command handler - resets a session to a fresh welcome.

use std::sync::Arc;
use thiserror::Error;

use crate::application::events::{EventSink, SessionEvent};
use crate::domain::conversation::Turn;
use crate::domain::foundation::SessionId;
use crate::ports::{ConversationStore, StoreError};

/// Command to clear a session's history.
#[derive(Debug, Clone)]
pub struct ClearSessionCommand {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Error)]
pub enum ClearSessionError {
    #[error("could not clear the session: {0}")]
    Store(#[from] StoreError),
}

/// Result of clearing a session.
#[derive(Debug, Clone)]
pub struct ClearSessionResult {
    /// Turns removed.
    pub removed: usize,
    /// The welcome turn now heading the session, if one is configured.
    pub welcome: Option<Turn>,
}

/// Handler for ClearSession commands.
pub struct ClearSessionHandler {
    store: Arc<dyn ConversationStore>,
    welcome_message: Option<String>,
}

impl ClearSessionHandler {
    pub fn new(store: Arc<dyn ConversationStore>, welcome_message: Option<String>) -> Self {
        Self {
            store,
            welcome_message,
        }
    }

    /// A fresh system welcome turn, if configured.
    pub fn welcome_turn(&self) -> Option<Turn> {
        self.welcome_message.as_deref().map(Turn::system)
    }

    /// Clears and re-seeds in one store operation, then emits the welcome.
    pub async fn handle(
        &self,
        cmd: ClearSessionCommand,
        events: &EventSink,
    ) -> Result<ClearSessionResult, ClearSessionError> {
        let welcome = self.welcome_turn();
        let outcome = self.store.clear(&cmd.session_id, welcome.as_ref()).await?;
        tracing::info!(session_id = %cmd.session_id, removed = outcome.removed, "Session cleared");

        let welcome = welcome.filter(|_| outcome.welcome_seeded);
        if let Some(turn) = &welcome {
            events.emit(SessionEvent::Turn(turn.clone())).await;
        }
        Ok(ClearSessionResult {
            removed: outcome.removed,
            welcome,
        })
    }
}
