//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::handlers::USER_TURN_NOT_SAVED;
use crate::application::{ClearSessionError, GetHistoryError, ProcessMessageError};
use crate::ports::StoreError;

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self {
            code: "NOT_FOUND".to_string(),
            message: format!("{} not found: {}", resource_type, id),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            code: "SERVICE_UNAVAILABLE".to_string(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
        }
    }
}

/// Failures surfaced by the request/response endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn from_store(err: &StoreError, message: &str) -> Self {
        if err.is_retryable() {
            ApiError::Unavailable(message.to_string())
        } else {
            ApiError::Internal(message.to_string())
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(message) => ErrorResponse::bad_request(message),
            ApiError::SessionNotFound(id) => ErrorResponse::not_found("Session", &id),
            ApiError::Unavailable(message) => ErrorResponse::unavailable(message),
            ApiError::Internal(message) => ErrorResponse::internal(message),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ProcessMessageError> for ApiError {
    fn from(err: ProcessMessageError) -> Self {
        match err {
            ProcessMessageError::EmptyContent => ApiError::BadRequest(err.to_string()),
            ProcessMessageError::Store(e) => ApiError::from_store(&e, USER_TURN_NOT_SAVED),
            ProcessMessageError::Interrupted => {
                ApiError::Unavailable("The server is shutting down. Please try again.".to_string())
            }
        }
    }
}

impl From<ClearSessionError> for ApiError {
    fn from(err: ClearSessionError) -> Self {
        match err {
            ClearSessionError::Store(e) => {
                ApiError::from_store(&e, "The conversation could not be cleared. Please try again.")
            }
        }
    }
}

impl From<GetHistoryError> for ApiError {
    fn from(err: GetHistoryError) -> Self {
        match err {
            GetHistoryError::NotFound(id) => ApiError::SessionNotFound(id.to_string()),
            GetHistoryError::Store(e) => {
                ApiError::from_store(&e, "The conversation history could not be read. Please try again.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;

    #[test]
    fn empty_message_maps_to_400() {
        let error: ApiError = ProcessMessageError::EmptyContent.into();
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_session_maps_to_404() {
        let error: ApiError = GetHistoryError::NotFound(SessionId::parse("gone").unwrap()).into();
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_outage_maps_to_503() {
        let error: ApiError =
            ProcessMessageError::Store(StoreError::Unavailable("down".to_string())).into();
        assert_eq!(error.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(error.to_string().contains("couldn't save your message"));
    }

    #[test]
    fn error_response_not_found_creates_correctly() {
        let error = ErrorResponse::not_found("Session", "abc-123");
        assert_eq!(error.code, "NOT_FOUND");
        assert!(error.message.contains("abc-123"));
    }
}
