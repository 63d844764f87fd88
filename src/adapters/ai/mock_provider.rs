//! Mock AI Provider for testing.
//!
//! Scripted replies (text, tool calls or errors) consumed in order, optional
//! per-request latency and call recording. When the script runs out it falls
//! back to a default reply, or echoes the last user message when built with
//! [`MockAIProvider::echoing`].

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, ProviderInfo, ToolCall,
};

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Text(String),
    Tool(ToolCall),
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

/// Mock AI provider for testing.
#[derive(Debug, Clone, Default)]
pub struct MockAIProvider {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    delay: Duration,
    echo: bool,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replies `echo: <last user message>` whenever the script is empty.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// Queues a text reply.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(MockResponse::Text(content.into()));
        self
    }

    /// Queues a tool call with JSON arguments.
    pub fn with_tool_call(self, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        self.push(MockResponse::Tool(ToolCall::new(name, arguments)));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(MockResponse::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues a response; clones share the same script.
    pub fn push(&self, response: MockResponse) {
        lock(&self.responses).push_back(response);
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        lock(&self.calls).clone()
    }

    fn next_response(&self, request: &CompletionRequest) -> MockResponse {
        lock(&self.responses).pop_front().unwrap_or_else(|| {
            if self.echo {
                MockResponse::Text(format!(
                    "echo: {}",
                    request.last_user_message().unwrap_or_default()
                ))
            } else {
                MockResponse::Text("Mock response".to_string())
            }
        })
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let response = self.next_response(&request);
        lock(&self.calls).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match response {
            MockResponse::Text(content) => Ok(CompletionResponse::text(content, "mock-model-1")),
            MockResponse::Tool(call) => Ok(CompletionResponse::tool(call, "mock-model-1")),
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("mock", "mock-model-1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MessageRole;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::new().with_message(MessageRole::User, text)
    }

    #[tokio::test]
    async fn returns_scripted_responses_in_order() {
        let provider = MockAIProvider::new()
            .with_response("first")
            .with_tool_call("get_order_status", serde_json::json!({"order_id": "UC1"}));

        let first = provider.complete(request("a")).await.unwrap();
        assert_eq!(first.content.as_deref(), Some("first"));

        let second = provider.complete(request("b")).await.unwrap();
        assert_eq!(second.tool_call.unwrap().name, "get_order_status");

        let third = provider.complete(request("c")).await.unwrap();
        assert_eq!(third.content.as_deref(), Some("Mock response"));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn injects_errors() {
        let provider = MockAIProvider::new().with_error(MockError::RateLimited { retry_after_secs: 5 });
        let err = provider.complete(request("a")).await.unwrap_err();
        assert!(matches!(err, AIError::RateLimited { retry_after_secs: 5 }));
    }

    #[tokio::test]
    async fn echoing_mode_repeats_last_user_message() {
        let provider = MockAIProvider::echoing();
        let reply = provider.complete(request("hello there")).await.unwrap();
        assert_eq!(reply.content.as_deref(), Some("echo: hello there"));
    }

    #[tokio::test]
    async fn records_calls() {
        let provider = MockAIProvider::new();
        provider.complete(request("tracked")).await.unwrap();
        assert_eq!(provider.get_calls()[0].last_user_message(), Some("tracked"));
    }
}
