//! Application handlers.
//!
//! Command and query handlers that orchestrate the conversation store, the
//! router and the support handlers.

mod clear_session;
mod get_history;
mod process_message;

pub use clear_session::{ClearSessionCommand, ClearSessionError, ClearSessionHandler, ClearSessionResult};
pub use get_history::{GetHistoryError, GetHistoryHandler, GetHistoryQuery, MAX_HISTORY_LIMIT};
pub use process_message::{
    ProcessMessageCommand, ProcessMessageError, ProcessMessageHandler, ProcessMessageResult,
    REPLY_NOT_SAVED, USER_TURN_NOT_SAVED,
};
