//! Session Gateway - owns live session connections and serializes work per session.
//!
//! Every session has one slot holding a turn lock. Anything that appends turns
//! for the session (connection messages, request/response submissions, clears)
//! runs under that lock, so a session's turns are produced strictly in arrival
//! order while different sessions proceed in parallel.
//!
//! A connected session gets a worker task draining its inbound queue. A second
//! connection for the same session supersedes the first: the old worker is
//! aborted and its event channel closes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

use crate::application::events::{EventSink, SessionEvent};
use crate::application::handlers::{
    ClearSessionCommand, ClearSessionError, ClearSessionHandler, ClearSessionResult, GetHistoryError,
    GetHistoryHandler, GetHistoryQuery, ProcessMessageCommand, ProcessMessageError, ProcessMessageHandler,
    ProcessMessageResult,
};
use crate::domain::conversation::{CloseReason, SessionState, TurnHistory};
use crate::domain::foundation::{SessionId, StateMachine};
use crate::ports::{ConversationStore, StoreError};

/// Runtime knobs for the gateway.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// A connection with no inbound message for this long is closed.
    pub idle_timeout: Duration,
    /// Stored turns replayed to a resuming connection.
    pub replay_limit: usize,
    /// Inbound messages queued per connection before senders wait.
    pub inbound_capacity: usize,
    /// Events buffered per connection before the pipeline waits.
    pub outbound_capacity: usize,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(1800),
            replay_limit: 50,
            inbound_capacity: 32,
            outbound_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("could not open session: {0}")]
    Store(#[from] StoreError),

    #[error("session connection is closed")]
    Closed,
}

/// A live connection handed to a transport.
///
/// The transport forwards client text into `inbound` and writes everything
/// from `events` to the client. `events` ends when the connection is closed
/// by the gateway (idle timeout, superseded, shutdown).
pub struct SessionConnection {
    pub session_id: SessionId,
    pub generation: u64,
    /// True when this connection created the session.
    pub is_new: bool,
    pub inbound: mpsc::Sender<String>,
    pub events: mpsc::Receiver<SessionEvent>,
}

impl SessionConnection {
    /// Queues a client message for sequential processing.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.inbound.send(text.into()).await.map_err(|_| SessionError::Closed)
    }

    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }
}

struct ActiveConnection {
    generation: u64,
    state: SessionState,
    outbound: mpsc::Sender<SessionEvent>,
    worker: JoinHandle<()>,
}

impl ActiveConnection {
    fn close(mut self, session_id: &SessionId, reason: CloseReason, abort: bool) {
        if abort {
            self.worker.abort();
        }
        match self.state.close(reason) {
            Ok(state) => {
                self.state = state;
                tracing::info!(session_id = %session_id, generation = self.generation, state = %self.state, "Connection closed");
            }
            Err(err) => tracing::warn!(session_id = %session_id, error = %err, "Unexpected connection state"),
        }
    }
}

#[derive(Default)]
struct SessionSlot {
    turn_lock: tokio::sync::Mutex<()>,
    connection: Mutex<Option<ActiveConnection>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionSlot {
    /// Events for whoever is connected right now.
    fn sink(&self) -> EventSink {
        match lock(&self.connection).as_ref() {
            Some(conn) => EventSink::channel(conn.outbound.clone()),
            None => EventSink::detached(),
        }
    }

    fn take_connection_if(&self, generation: u64) -> Option<ActiveConnection> {
        let mut connection = lock(&self.connection);
        match connection.as_ref() {
            Some(conn) if conn.generation == generation => connection.take(),
            _ => None,
        }
    }
}

struct GatewayInner {
    store: Arc<dyn ConversationStore>,
    pipeline: Arc<ProcessMessageHandler>,
    clearer: Arc<ClearSessionHandler>,
    history: GetHistoryHandler,
    settings: GatewaySettings,
    slots: RwLock<HashMap<SessionId, Arc<SessionSlot>>>,
    generations: AtomicU64,
}

impl GatewayInner {
    async fn slot(&self, session_id: &SessionId) -> Arc<SessionSlot> {
        if let Some(slot) = self.slots.read().await.get(session_id) {
            return slot.clone();
        }
        self.slots
            .write()
            .await
            .entry(session_id.clone())
            .or_default()
            .clone()
    }

    /// Drops the slot once nothing holds it and nobody is connected.
    ///
    /// Slot handles are only cloned under the map lock, so the count seen here
    /// is exact.
    async fn release_slot_if_idle(&self, session_id: &SessionId) {
        let mut slots = self.slots.write().await;
        let idle = slots
            .get(session_id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1 && lock(&slot.connection).is_none());
        if idle {
            slots.remove(session_id);
        }
    }
}

/// Entry point for transports: connections, submissions, clears and history.
#[derive(Clone)]
pub struct SessionGateway {
    inner: Arc<GatewayInner>,
}

impl SessionGateway {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        pipeline: Arc<ProcessMessageHandler>,
        clearer: Arc<ClearSessionHandler>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                history: GetHistoryHandler::new(store.clone()),
                store,
                pipeline,
                clearer,
                settings,
                slots: RwLock::new(HashMap::new()),
                generations: AtomicU64::new(1),
            }),
        }
    }

    /// Opens a connection for `session_id`.
    ///
    /// A session the store has never seen is created and seeded with the
    /// welcome turn, which is the first event. A known session has its last
    /// `replay_limit` turns replayed instead. Any older connection for the same
    /// session is superseded.
    pub async fn connect(&self, session_id: SessionId) -> Result<SessionConnection, SessionError> {
        let inner = &self.inner;
        let slot = inner.slot(&session_id).await;
        let generation = inner.generations.fetch_add(1, Ordering::Relaxed);
        let capacity = inner
            .settings
            .outbound_capacity
            .max(inner.settings.replay_limit + 1)
            .max(1);
        let (out_tx, out_rx) = mpsc::channel(capacity);
        let (in_tx, in_rx) = mpsc::channel(inner.settings.inbound_capacity.max(1));
        let state = SessionState::Connecting;

        let _turn = slot.turn_lock.lock().await;
        let opened = self.open(&session_id, &EventSink::channel(out_tx.clone())).await;
        let is_new = match opened {
            Ok(is_new) => is_new,
            Err(err) => {
                if let Ok(state) = state.close(CloseReason::ServerShutdown) {
                    tracing::error!(session_id = %session_id, %state, error = %err, "Session could not be opened");
                }
                drop(_turn);
                drop(slot);
                inner.release_slot_if_idle(&session_id).await;
                return Err(err);
            }
        };

        let worker = tokio::spawn(run_worker(
            inner.clone(),
            session_id.clone(),
            slot.clone(),
            generation,
            in_rx,
            out_tx.clone(),
        ));
        let active = ActiveConnection {
            generation,
            state: state.transition_to(SessionState::Active).unwrap_or(SessionState::Active),
            outbound: out_tx,
            worker,
        };
        let previous = lock(&slot.connection).replace(active);
        if let Some(previous) = previous {
            previous.close(&session_id, CloseReason::Superseded, true);
        }
        tracing::info!(session_id = %session_id, generation, is_new, "Connection active");

        Ok(SessionConnection {
            session_id,
            generation,
            is_new,
            inbound: in_tx,
            events: out_rx,
        })
    }

    /// Seeds a new session or replays a known one. Runs under the turn lock.
    async fn open(&self, session_id: &SessionId, sink: &EventSink) -> Result<bool, SessionError> {
        let inner = &self.inner;
        let summary = inner.store.open_session(session_id).await?;
        if summary.is_new {
            if let Some(welcome) = inner.clearer.welcome_turn() {
                inner.store.append(session_id, &welcome).await?;
                sink.emit(SessionEvent::Turn(welcome)).await;
            }
        } else {
            let history = inner.store.history(session_id, inner.settings.replay_limit).await?;
            tracing::debug!(session_id = %session_id, turns = history.len(), "Replaying history");
            for turn in history {
                sink.emit(SessionEvent::Turn(turn)).await;
            }
        }
        Ok(summary.is_new)
    }

    /// Ends a connection at the client's request, cancelling its in-flight message.
    pub async fn disconnect(&self, session_id: &SessionId, generation: u64) {
        let slot = match self.inner.slots.read().await.get(session_id) {
            Some(slot) => slot.clone(),
            None => return,
        };
        if let Some(mut conn) = slot.take_connection_if(generation) {
            conn.worker.abort();
            let _ = (&mut conn.worker).await;
            conn.close(session_id, CloseReason::ClientClosed, false);
        }
        drop(slot);
        self.inner.release_slot_if_idle(session_id).await;
    }

    /// Runs a message through the pipeline outside a connection.
    ///
    /// Serialized with the session's connection (if any), which also receives
    /// the resulting events. The pipeline runs on its own task; dropping the
    /// returned future does not cancel it.
    pub async fn submit(
        &self,
        session_id: SessionId,
        message: impl Into<String>,
    ) -> Result<ProcessMessageResult, ProcessMessageError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ProcessMessageError::EmptyContent);
        }
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let slot = inner.slot(&session_id).await;
            let result = {
                let _turn = slot.turn_lock.lock().await;
                let sink = slot.sink();
                inner
                    .pipeline
                    .handle(ProcessMessageCommand::new(session_id.clone(), message), &sink)
                    .await
            };
            drop(slot);
            inner.release_slot_if_idle(&session_id).await;
            result
        });
        match task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(ProcessMessageError::Interrupted),
        }
    }

    /// Clears the session and re-seeds the welcome, emitting it to any connection.
    pub async fn clear(&self, session_id: SessionId) -> Result<ClearSessionResult, ClearSessionError> {
        let slot = self.inner.slot(&session_id).await;
        let result = {
            let _turn = slot.turn_lock.lock().await;
            let sink = slot.sink();
            self.inner
                .clearer
                .handle(ClearSessionCommand { session_id: session_id.clone() }, &sink)
                .await
        };
        drop(slot);
        self.inner.release_slot_if_idle(&session_id).await;
        result
    }

    pub async fn history(&self, session_id: SessionId, limit: usize) -> Result<TurnHistory, GetHistoryError> {
        self.inner.history.handle(GetHistoryQuery { session_id, limit }).await
    }

    /// Welcome text new and cleared sessions start with.
    pub fn welcome_message(&self) -> Option<String> {
        self.inner.clearer.welcome_turn().map(|t| t.content().to_string())
    }

    /// Number of sessions with a live connection.
    pub async fn active_connections(&self) -> usize {
        self.inner
            .slots
            .read()
            .await
            .values()
            .filter(|slot| lock(&slot.connection).is_some())
            .count()
    }

    /// Closes every connection.
    pub async fn shutdown(&self) {
        let slots: Vec<(SessionId, Arc<SessionSlot>)> = self
            .inner
            .slots
            .write()
            .await
            .drain()
            .collect();
        for (session_id, slot) in slots {
            if let Some(conn) = lock(&slot.connection).take() {
                conn.close(&session_id, CloseReason::ServerShutdown, true);
            }
        }
    }
}

/// Drains one connection's inbound queue, one message at a time.
async fn run_worker(
    inner: Arc<GatewayInner>,
    session_id: SessionId,
    slot: Arc<SessionSlot>,
    generation: u64,
    mut inbound: mpsc::Receiver<String>,
    outbound: mpsc::Sender<SessionEvent>,
) {
    let sink = EventSink::channel(outbound);
    let reason = loop {
        match tokio::time::timeout(inner.settings.idle_timeout, inbound.recv()).await {
            Ok(Some(text)) => {
                if text.trim().is_empty() {
                    tracing::debug!(session_id = %session_id, "Ignoring empty message");
                    continue;
                }
                let _turn = slot.turn_lock.lock().await;
                let cmd = ProcessMessageCommand::new(session_id.clone(), text);
                if let Ok(result) = inner.pipeline.handle(cmd, &sink).await {
                    tracing::debug!(
                        session_id = %session_id,
                        turn_id = %result.reply.id(),
                        persisted = result.reply_persisted,
                        "Message processed"
                    );
                }
            }
            Ok(None) => break CloseReason::ClientClosed,
            Err(_) => break CloseReason::IdleTimeout,
        }
    };

    drop(sink);
    if let Some(conn) = slot.take_connection_if(generation) {
        conn.close(&session_id, reason, false);
    }
    drop(slot);
    inner.release_slot_if_idle(&session_id).await;
}
