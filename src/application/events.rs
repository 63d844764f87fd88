//! Events delivered to a session's connection, in emission order.

use tokio::sync::mpsc;

use crate::domain::conversation::Turn;

/// Transient processing status shown while a reply is being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Typing,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Typing => "typing",
        }
    }
}

/// Something the connection should show.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Status(SessionStatus),
    /// A turn to show. Usually stored; error turns about the store itself are not.
    Turn(Turn),
}

/// Where a pipeline run sends its events.
///
/// A detached sink drops events; used for request/response callers with no
/// live connection.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<SessionEvent>>,
}

impl EventSink {
    pub fn channel(tx: mpsc::Sender<SessionEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn detached() -> Self {
        Self::default()
    }

    /// Sends an event, waiting for room. A closed connection only loses the event.
    pub async fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).await.is_err() {
                tracing::debug!("Connection gone, event dropped");
            }
        }
    }
}
