//! HTTP DTOs for chat endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::{Turn, TurnHistory};
use crate::domain::foundation::SessionId;

/// Default page size for history requests.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to process one message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Existing session; a new one is generated when omitted.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Query parameters for history.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Reply to a processed message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
}

impl ChatResponse {
    pub fn new(session_id: &SessionId, reply: &Turn) -> Self {
        Self {
            response: reply.content().to_string(),
            session_id: session_id.to_string(),
            role: reply.role().as_str().to_string(),
            handler: reply.handler().map(|h| h.to_string()),
        }
    }
}

/// Result of clearing a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
}

impl ClearResponse {
    pub fn success(welcome: Option<&Turn>) -> Self {
        Self {
            status: "success".to_string(),
            message: "Chat history cleared".to_string(),
            welcome_message: welcome.map(|t| t.content().to_string()),
        }
    }
}

/// A stored turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub id: String,
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    pub timestamp: String,
}

impl From<&Turn> for TurnResponse {
    fn from(turn: &Turn) -> Self {
        Self {
            id: turn.id().to_string(),
            role: turn.role().as_str().to_string(),
            content: turn.content().to_string(),
            handler: turn.handler().map(|h| h.to_string()),
            error_kind: turn.error_kind().map(|k| k.as_str().to_string()),
            timestamp: turn.timestamp().as_datetime().to_rfc3339(),
        }
    }
}

/// Ordered turns of a session, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub turns: Vec<TurnResponse>,
}

impl HistoryResponse {
    pub fn new(session_id: &SessionId, history: &TurnHistory) -> Self {
        Self {
            session_id: session_id.to_string(),
            turns: history.iter().map(TurnResponse::from).collect(),
        }
    }
}

/// Liveness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::HandlerId;

    #[test]
    fn chat_request_without_session_deserializes() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "hello"}"#).unwrap();
        assert_eq!(req.message, "hello");
        assert!(req.session_id.is_none());
    }

    #[test]
    fn history_limit_defaults() {
        let params: HistoryParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn chat_response_reports_role_and_handler() {
        let session = SessionId::parse("abc").unwrap();
        let reply = Turn::assistant("Here you go", HandlerId::new("orders").unwrap());

        let json = serde_json::to_value(ChatResponse::new(&session, &reply)).unwrap();

        assert_eq!(json["session_id"], "abc");
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["handler"], "orders");
    }

    #[test]
    fn clear_response_shape() {
        let welcome = Turn::system("Welcome!");
        let json = serde_json::to_value(ClearResponse::success(Some(&welcome))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "success",
                "message": "Chat history cleared",
                "welcome_message": "Welcome!"
            })
        );
    }
}
