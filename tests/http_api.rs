//! Request/response endpoints through the assembled router.

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{next_turn, session, Harness};
use support_router::adapters::ai::MockAIProvider;
use support_router::adapters::http::app_router;
use support_router::config::{ServerConfig, DEFAULT_WELCOME};
use support_router::domain::conversation::Role;

fn router(harness: &Harness) -> Router {
    app_router(harness.gateway.clone(), &ServerConfig::default())
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let harness = Harness::new();

    let (status, body) = send(router(&harness), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn chat_without_session_generates_one() {
    let harness = Harness::new();

    let (status, body) = send(router(&harness), post_json("/chat", json!({"message": "hi there"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "echo: hi there");
    assert_eq!(body["role"], "assistant");
    assert_eq!(body["handler"], "product_details");
    let id = body["session_id"].as_str().unwrap();
    assert_eq!(harness.stored(&session(id)).await.len(), 2);
}

#[tokio::test]
async fn chat_rejects_blank_message() {
    let harness = Harness::new();

    let (status, body) = send(
        router(&harness),
        post_json("/chat", json!({"message": "  ", "session_id": "abc"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn chat_reply_reaches_connected_client() {
    let harness = Harness::new();
    let mut conn = harness.gateway.connect(session("shared")).await.unwrap();
    next_turn(&mut conn).await;

    let (status, body) = send(
        router(&harness),
        post_json("/chat", json!({"message": "order status", "session_id": "shared"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(next_turn(&mut conn).await.content(), body["response"].as_str().unwrap());
}

#[tokio::test]
async fn history_of_unknown_session_is_404() {
    let harness = Harness::new();

    let (status, body) = send(router(&harness), get("/chat/nobody/history")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn history_respects_limit() {
    let harness = Harness::new();
    for text in ["one", "two", "three"] {
        harness.gateway.submit(session("paged"), text).await.unwrap();
    }

    let (status, body) = send(router(&harness), get("/chat/paged/history?limit=2")).await;

    assert_eq!(status, StatusCode::OK);
    let turns = body["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[0]["content"], "three");
    assert_eq!(turns[1]["content"], "echo: three");
}

#[tokio::test]
async fn clear_returns_welcome_and_resets_history() {
    let harness = Harness::new();
    harness.gateway.submit(session("reset"), "hello").await.unwrap();

    let (status, body) = send(router(&harness), post_json("/chat/reset/clear", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Chat history cleared");
    assert_eq!(body["welcome_message"], DEFAULT_WELCOME);

    let (_, history) = send(router(&harness), get("/chat/reset/history")).await;
    let turns = history["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0]["role"], "system");
}

#[tokio::test]
async fn invalid_session_id_is_rejected() {
    let harness = Harness::new();

    let (status, _) = send(router(&harness), get("/chat/not%20valid/history")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn timed_out_request_still_records_the_order_outcome() {
    let provider = MockAIProvider::echoing()
        .with_tool_call(
            "create_order",
            json!({
                "product_id": "Ultra Comfort Mattress",
                "size": "Queen",
                "quantity": 1,
                "delivery_address": "1 Main St, Springfield",
                "payment_method": "paypal"
            }),
        )
        .with_response("Your order is confirmed.")
        .with_delay(Duration::from_millis(700));
    let harness = Harness::builder().provider(provider).build();
    let server = ServerConfig {
        request_timeout_secs: 1,
        ..ServerConfig::default()
    };
    let id = session("patient-buyer");

    let (status, _) = send(
        app_router(harness.gateway.clone(), &server),
        post_json("/chat", json!({"message": "place an order", "session_id": "patient-buyer"})),
    )
    .await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);

    let mut turns = harness.stored(&id).await;
    for _ in 0..50 {
        if turns.len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        turns = harness.stored(&id).await;
    }
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].role(), Role::Assistant);
    assert_eq!(turns[1].content(), "Your order is confirmed.");
    assert_eq!(harness.catalog.order_write_attempts(), 1);
    assert_eq!(harness.catalog.order_count().await, 1);
}
