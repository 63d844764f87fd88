//! HTTP handlers for chat endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::adapters::http::ApiError;
use crate::application::SessionGateway;
use crate::domain::foundation::SessionId;

use super::dto::{ChatRequest, ChatResponse, ClearResponse, HealthResponse, HistoryParams, HistoryResponse};

fn parse_session(raw: String) -> Result<SessionId, ApiError> {
    SessionId::parse(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// POST /chat - Process one message
///
/// Runs through the same per-session pipeline as the WebSocket; a connected
/// client for the session sees the reply too.
pub async fn chat(
    State(gateway): State<SessionGateway>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session_id = match req.session_id {
        Some(raw) => parse_session(raw)?,
        None => SessionId::generate(),
    };

    let result = gateway.submit(session_id.clone(), req.message).await?;

    Ok(Json(ChatResponse::new(&session_id, &result.reply)))
}

/// POST /chat/:session_id/clear - Reset a session to the welcome turn
pub async fn clear_chat(
    State(gateway): State<SessionGateway>,
    Path(session_id): Path<String>,
) -> Result<Json<ClearResponse>, ApiError> {
    let session_id = parse_session(session_id)?;

    let result = gateway.clear(session_id).await?;

    Ok(Json(ClearResponse::success(result.welcome.as_ref())))
}

/// GET /chat/:session_id/history - Most recent turns, oldest first
pub async fn chat_history(
    State(gateway): State<SessionGateway>,
    Path(session_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session_id = parse_session(session_id)?;

    let history = gateway.history(session_id.clone(), params.limit).await?;

    Ok(Json(HistoryResponse::new(&session_id, &history)))
}

/// GET /health - Liveness
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
