//! WebSocket upgrade handler for chat sessions.
//!
//! Handles the HTTP → WebSocket upgrade and bridges the socket to the
//! session gateway:
//! 1. Validate the session id
//! 2. Upgrade and open a gateway connection (welcome or replay)
//! 3. Forward client text to the gateway and gateway events to the client
//! 4. Cancel the in-flight message when the client goes away

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};

use crate::adapters::http::ErrorResponse;
use crate::application::SessionGateway;
use crate::domain::conversation::TurnErrorKind;
use crate::domain::foundation::SessionId;

use super::messages::ServerMessage;

/// Sent when the session cannot be opened at all.
pub const SESSION_UNAVAILABLE: &str =
    "Sorry, this conversation can't be opened right now. Please try again shortly.";

/// Handle WebSocket upgrade requests for a chat session.
///
/// Route: `GET /ws/chat/:session_id`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(gateway): State<SessionGateway>,
) -> Response {
    let session_id = match SessionId::parse(session_id) {
        Ok(id) => id,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(e.to_string())),
            )
                .into_response()
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, session_id, gateway))
}

/// Runs for the lifetime of the connection.
async fn handle_socket(socket: WebSocket, session_id: SessionId, gateway: SessionGateway) {
    let (mut sender, mut receiver) = socket.split();

    let connection = match gateway.connect(session_id.clone()).await {
        Ok(connection) => connection,
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "Failed to open session");
            let msg = ServerMessage::error(TurnErrorKind::Session, SESSION_UNAVAILABLE);
            if send_message(&mut sender, &msg).await.is_ok() {
                let _ = sender.send(Message::Close(None)).await;
            }
            return;
        }
    };
    let generation = connection.generation;
    let inbound = connection.inbound;
    let mut events = connection.events;

    // Gateway events → client. Ends when the gateway closes the connection.
    let mut send_task = {
        let session_id = session_id.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let msg = ServerMessage::from(&event);
                if let Err(e) = send_message(&mut sender, &msg).await {
                    tracing::debug!(session_id = %session_id, "Send error, closing connection: {}", e);
                    return;
                }
            }
            let _ = sender.send(Message::Close(None)).await;
        })
    };

    // Client → gateway. Ends when the client goes away.
    let mut recv_task = {
        let session_id = session_id.clone();
        tokio::spawn(async move {
            while let Some(result) = receiver.next().await {
                match result {
                    Ok(Message::Text(text)) => {
                        if inbound.send(text).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Binary(_)) => {
                        tracing::warn!(session_id = %session_id, "Received unsupported binary message");
                    }
                    // Protocol pings are answered by axum
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                    Ok(Message::Close(_)) => {
                        tracing::debug!(session_id = %session_id, "Client sent close frame");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(session_id = %session_id, "Receive error: {}", e);
                        break;
                    }
                }
            }
        })
    };

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            gateway.disconnect(&session_id, generation).await;
            send_task.abort();
        }
    }
}

/// Send a JSON message over the WebSocket.
async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

/// Create axum router for the chat WebSocket endpoint.
pub fn websocket_router(gateway: SessionGateway) -> axum::Router {
    use axum::routing::get;

    axum::Router::new()
        .route("/ws/chat/:session_id", get(ws_handler))
        .with_state(gateway)
}
