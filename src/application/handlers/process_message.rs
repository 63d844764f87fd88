//! ProcessMessage command handler.
//!
//! Runs one inbound message through the whole pipeline: record the user turn,
//! route it, let the selected handler reply, record the reply and emit it.
//! Callers serialize invocations per session.

use std::sync::Arc;
use thiserror::Error;

use crate::application::events::{EventSink, SessionEvent, SessionStatus};
use crate::application::routing::SupportRouter;
use crate::application::support::{HandlerSet, SideEffect};
use crate::domain::conversation::{Turn, TurnErrorKind, TurnHistory};
use crate::domain::foundation::{SessionId, TurnId};
use crate::domain::routing::RoutingDecision;
use crate::ports::{ConversationStore, StoreError};

/// Shown when the user's message could not be recorded.
pub const USER_TURN_NOT_SAVED: &str =
    "Sorry, we couldn't save your message right now, so it wasn't processed. Please try again.";

/// Shown after a reply that could not be recorded.
pub const REPLY_NOT_SAVED: &str =
    "This reply could not be saved, so the conversation history may be incomplete.";

/// Command to process one inbound message.
#[derive(Debug, Clone)]
pub struct ProcessMessageCommand {
    pub session_id: SessionId,
    pub content: String,
}

impl ProcessMessageCommand {
    pub fn new(session_id: SessionId, content: impl Into<String>) -> Self {
        Self {
            session_id,
            content: content.into(),
        }
    }
}

/// Errors that stop the pipeline for a message.
#[derive(Debug, Clone, Error)]
pub enum ProcessMessageError {
    /// Message content is empty or whitespace only.
    #[error("message content cannot be empty")]
    EmptyContent,

    /// The user turn could not be recorded; nothing else happened.
    #[error("could not record the message: {0}")]
    Store(#[from] StoreError),

    /// The runtime stopped before the message finished processing.
    #[error("message processing was interrupted")]
    Interrupted,
}

/// Result of processing one message.
#[derive(Debug, Clone)]
pub struct ProcessMessageResult {
    pub user_turn_id: TurnId,
    pub decision: RoutingDecision,
    /// The reply turn, as delivered.
    pub reply: Turn,
    pub side_effects: Vec<SideEffect>,
    /// Whether the reply turn made it into the store.
    pub reply_persisted: bool,
}

/// Handler for ProcessMessage commands.
pub struct ProcessMessageHandler {
    store: Arc<dyn ConversationStore>,
    router: Arc<SupportRouter>,
    handlers: Arc<HandlerSet>,
    /// Turns loaded as context; covers both the routing and reply windows.
    context_turns: usize,
}

impl ProcessMessageHandler {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        router: Arc<SupportRouter>,
        handlers: Arc<HandlerSet>,
        context_turns: usize,
    ) -> Self {
        Self {
            store,
            router,
            handlers,
            context_turns,
        }
    }

    /// Handles a process message command, emitting events to `events` as it goes.
    ///
    /// Emission order per message is: typing status, then the reply turn, then
    /// (only if the reply could not be recorded) an unstored session error turn.
    pub async fn handle(
        &self,
        cmd: ProcessMessageCommand,
        events: &EventSink,
    ) -> Result<ProcessMessageResult, ProcessMessageError> {
        let content = cmd.content.trim();
        let user_turn = Turn::user(content).map_err(|_| ProcessMessageError::EmptyContent)?;
        let session_id = &cmd.session_id;

        if let Err(err) = self.store.append(session_id, &user_turn).await {
            tracing::error!(session_id = %session_id, error = %err, "Failed to record user turn");
            events
                .emit(SessionEvent::Turn(Turn::error(USER_TURN_NOT_SAVED, TurnErrorKind::Session, None)))
                .await;
            return Err(err.into());
        }

        events.emit(SessionEvent::Status(SessionStatus::Typing)).await;

        let history = self.prior_turns(session_id, &user_turn).await;
        let decision = self.router.route(content, &history).await;
        let (handler_id, reply) = self.handlers.dispatch(&decision, content, &history).await;
        let side_effects = reply.side_effects.clone();
        let reply = reply.into_turn(handler_id);

        let reply_persisted = match self.store.append(session_id, &reply).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(session_id = %session_id, turn_id = %reply.id(), error = %err, "Failed to record reply turn");
                false
            }
        };

        events.emit(SessionEvent::Turn(reply.clone())).await;
        if !reply_persisted {
            events
                .emit(SessionEvent::Turn(Turn::error(REPLY_NOT_SAVED, TurnErrorKind::Session, None)))
                .await;
        }

        Ok(ProcessMessageResult {
            user_turn_id: *user_turn.id(),
            decision,
            reply,
            side_effects,
            reply_persisted,
        })
    }

    /// Turns recorded before `current`. A failed read degrades to no context.
    async fn prior_turns(&self, session_id: &SessionId, current: &Turn) -> TurnHistory {
        match self.store.history(session_id, self.context_turns + 1).await {
            Ok(history) => {
                let turns = history
                    .into_iter()
                    .filter(|t| t.id() != current.id())
                    .collect::<Vec<_>>();
                TurnHistory::from_tail(turns, self.context_turns)
            }
            Err(err) => {
                tracing::warn!(session_id = %session_id, error = %err, "History unavailable, routing without context");
                TurnHistory::default()
            }
        }
    }
}
