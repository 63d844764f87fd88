//! Chat HTTP endpoints - request/response access to sessions.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::chat_routes;
