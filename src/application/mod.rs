//! Application layer - routing, support handlers, the message pipeline and the
//! session gateway.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod events;
pub mod gateway;
pub mod handlers;
pub mod routing;
pub mod support;

pub use events::{EventSink, SessionEvent, SessionStatus};
pub use gateway::{GatewaySettings, SessionConnection, SessionError, SessionGateway};
pub use handlers::{
    ClearSessionCommand, ClearSessionError, ClearSessionHandler, ClearSessionResult, GetHistoryError,
    GetHistoryHandler, GetHistoryQuery, ProcessMessageCommand, ProcessMessageError, ProcessMessageHandler,
    ProcessMessageResult,
};
pub use routing::SupportRouter;
