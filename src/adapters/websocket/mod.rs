//! WebSocket adapter for live chat sessions.
//!
//! One socket per session id. Client text frames feed the session gateway;
//! gateway events (typing status, delivered turns) are written back as JSON.
//!
//! - [`messages`] - server → client frame types
//! - [`handler`] - axum upgrade handler and socket pump

pub mod handler;
pub mod messages;

pub use handler::{websocket_router, ws_handler};
pub use messages::ServerMessage;
