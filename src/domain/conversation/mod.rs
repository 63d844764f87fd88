//! Conversation module - turns, per-session history and session lifecycle.

mod history;
mod session;
mod turn;

pub use history::TurnHistory;
pub use session::{CloseReason, SessionState, SessionSummary};
pub use turn::{Role, Turn, TurnErrorKind};
