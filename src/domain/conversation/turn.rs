//! Turn entity: one immutable message exchanged within a session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{HandlerId, Timestamp, TurnId, ValidationError};

/// Role a turn is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
    Error,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Error => "error",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            "error" => Ok(Role::Error),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

/// Category of a user-visible failure recorded as an error turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnErrorKind {
    /// Bad input to a handler; the reply explains what is missing.
    Validation,
    /// A product, review or order collaborator failed.
    DataAccess,
    /// The language-model collaborator failed while composing a reply.
    Upstream,
    /// The conversation store failed for this session.
    Session,
}

impl TurnErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnErrorKind::Validation => "validation",
            TurnErrorKind::DataAccess => "data_access",
            TurnErrorKind::Upstream => "upstream",
            TurnErrorKind::Session => "session",
        }
    }
}

impl FromStr for TurnErrorKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validation" => Ok(TurnErrorKind::Validation),
            "data_access" => Ok(TurnErrorKind::DataAccess),
            "upstream" => Ok(TurnErrorKind::Upstream),
            "session" => Ok(TurnErrorKind::Session),
            other => Err(ValidationError::invalid_format(
                "error_kind",
                format!("unknown error kind '{}'", other),
            )),
        }
    }
}

/// An immutable turn within a session.
///
/// # Invariants
///
/// - `error_kind` is set if and only if `role` is [`Role::Error`]
/// - user turns never carry a handler attribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    id: TurnId,
    role: Role,
    content: String,
    timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    handler: Option<HandlerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<TurnErrorKind>,
}

impl Turn {
    /// Creates a user turn from raw client text.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the text is empty or whitespace
    pub fn user(content: impl Into<String>) -> Result<Self, ValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::empty_field("content"));
        }
        Ok(Self::build(Role::User, content, None, None))
    }

    /// Creates an assistant reply attributed to the handler that produced it.
    pub fn assistant(content: impl Into<String>, handler: HandlerId) -> Self {
        Self::build(Role::Assistant, content.into(), Some(handler), None)
    }

    /// Creates a system turn (welcome text).
    pub fn system(content: impl Into<String>) -> Self {
        Self::build(Role::System, content.into(), None, None)
    }

    /// Creates an error turn, optionally attributed to a handler.
    pub fn error(
        content: impl Into<String>,
        kind: TurnErrorKind,
        handler: Option<HandlerId>,
    ) -> Self {
        Self::build(Role::Error, content.into(), handler, Some(kind))
    }

    /// Reconstitutes a turn from persistence (no validation).
    pub fn reconstitute(
        id: TurnId,
        role: Role,
        content: String,
        timestamp: Timestamp,
        handler: Option<HandlerId>,
        error_kind: Option<TurnErrorKind>,
    ) -> Self {
        Self {
            id,
            role,
            content,
            timestamp,
            handler,
            error_kind,
        }
    }

    fn build(
        role: Role,
        content: String,
        handler: Option<HandlerId>,
        error_kind: Option<TurnErrorKind>,
    ) -> Self {
        Self {
            id: TurnId::new(),
            role,
            content,
            timestamp: Timestamp::now(),
            handler,
            error_kind,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &TurnId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    /// Handler that produced this turn, if any.
    pub fn handler(&self) -> Option<&HandlerId> {
        self.handler.as_ref()
    }

    pub fn error_kind(&self) -> Option<TurnErrorKind> {
        self.error_kind
    }

    pub fn is_error(&self) -> bool {
        self.role == Role::Error
    }
}
