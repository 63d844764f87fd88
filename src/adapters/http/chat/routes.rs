//! HTTP routes for chat endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::application::SessionGateway;

use super::handlers::{chat, chat_history, clear_chat, health};

/// Creates the chat router with all request/response endpoints.
pub fn chat_routes(gateway: SessionGateway) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/:session_id/clear", post(clear_chat))
        .route("/chat/:session_id/history", get(chat_history))
        .route("/health", get(health))
        .with_state(gateway)
}
