//! WebSocket message types for chat sessions.
//!
//! Server → client frames are JSON objects `{type, content}` where `type` is
//! either `status` (transient, e.g. typing) or the role of a delivered turn
//! (`user`, `assistant`, `system`, `error`). Client → server frames are raw
//! message text.

use serde::{Deserialize, Serialize};

use crate::application::{SessionEvent, SessionStatus};
use crate::domain::conversation::{Role, Turn, TurnErrorKind};

/// Frame type for transient status updates.
pub const STATUS_TYPE: &str = "status";

/// A frame sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    /// Handler that produced an assistant or error turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl ServerMessage {
    pub fn status(status: SessionStatus) -> Self {
        Self {
            kind: STATUS_TYPE.to_string(),
            content: status.as_str().to_string(),
            handler: None,
            error_kind: None,
        }
    }

    pub fn turn(turn: &Turn) -> Self {
        Self {
            kind: turn.role().as_str().to_string(),
            content: turn.content().to_string(),
            handler: turn.handler().map(|h| h.to_string()),
            error_kind: turn.error_kind().map(|k| k.as_str().to_string()),
        }
    }

    /// An error frame that is not backed by a stored turn.
    pub fn error(kind: TurnErrorKind, content: impl Into<String>) -> Self {
        Self {
            kind: Role::Error.as_str().to_string(),
            content: content.into(),
            handler: None,
            error_kind: Some(kind.as_str().to_string()),
        }
    }
}

impl From<&SessionEvent> for ServerMessage {
    fn from(event: &SessionEvent) -> Self {
        match event {
            SessionEvent::Status(status) => Self::status(*status),
            SessionEvent::Turn(turn) => Self::turn(turn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::HandlerId;

    #[test]
    fn typing_status_serializes_as_status_frame() {
        let json = serde_json::to_value(ServerMessage::status(SessionStatus::Typing)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "status", "content": "typing"}));
    }

    #[test]
    fn assistant_turn_carries_role_and_handler() {
        let turn = Turn::assistant("We have three mattresses.", HandlerId::new("product_details").unwrap());

        let msg = ServerMessage::from(&SessionEvent::Turn(turn));

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "assistant");
        assert_eq!(json["content"], "We have three mattresses.");
        assert_eq!(json["handler"], "product_details");
        assert!(json.get("error_kind").is_none());
    }

    #[test]
    fn error_turn_uses_error_type() {
        let turn = Turn::error("Saving failed", TurnErrorKind::DataAccess, None);

        let json = serde_json::to_value(ServerMessage::turn(&turn)).unwrap();

        assert_eq!(json["type"], "error");
        assert_eq!(json["error_kind"], "data_access");
    }

    #[test]
    fn system_welcome_has_system_type() {
        let json = serde_json::to_string(&ServerMessage::turn(&Turn::system("Welcome!"))).unwrap();
        assert!(json.contains(r#""type":"system""#));
    }
}
