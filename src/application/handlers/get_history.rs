//! GetHistory query handler.

use std::sync::Arc;
use thiserror::Error;

use crate::domain::conversation::TurnHistory;
use crate::domain::foundation::SessionId;
use crate::ports::{ConversationStore, StoreError};

/// Largest history page a caller may ask for.
pub const MAX_HISTORY_LIMIT: usize = 200;

/// Query for the most recent turns of a session.
#[derive(Debug, Clone)]
pub struct GetHistoryQuery {
    pub session_id: SessionId,
    pub limit: usize,
}

#[derive(Debug, Clone, Error)]
pub enum GetHistoryError {
    #[error("session not found: {0}")]
    NotFound(SessionId),

    #[error("could not read history: {0}")]
    Store(#[from] StoreError),
}

pub struct GetHistoryHandler {
    store: Arc<dyn ConversationStore>,
}

impl GetHistoryHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Returns up to `limit` turns (capped at [`MAX_HISTORY_LIMIT`]), oldest first.
    pub async fn handle(&self, query: GetHistoryQuery) -> Result<TurnHistory, GetHistoryError> {
        if self.store.find_session(&query.session_id).await?.is_none() {
            return Err(GetHistoryError::NotFound(query.session_id));
        }
        let limit = query.limit.min(MAX_HISTORY_LIMIT);
        Ok(self.store.history(&query.session_id, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryConversationStore;
    use crate::domain::conversation::Turn;

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let handler = GetHistoryHandler::new(Arc::new(InMemoryConversationStore::new()));

        let result = handler
            .handle(GetHistoryQuery {
                session_id: SessionId::parse("nobody").unwrap(),
                limit: 10,
            })
            .await;

        assert!(matches!(result, Err(GetHistoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn returns_most_recent_turns_in_order() {
        let store = Arc::new(InMemoryConversationStore::new());
        let session = SessionId::parse("someone").unwrap();
        for i in 0..5 {
            store.append(&session, &Turn::user(format!("m{}", i)).unwrap()).await.unwrap();
        }
        let handler = GetHistoryHandler::new(store);

        let history = handler
            .handle(GetHistoryQuery { session_id: session, limit: 3 })
            .await
            .unwrap();

        let contents: Vec<&str> = history.iter().map(Turn::content).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }
}
