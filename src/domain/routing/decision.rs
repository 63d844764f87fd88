//! The categorical routing decision and classifier output interpretation.

use serde::Serialize;
use std::fmt;

use super::{HandlerKind, HandlerRegistry};
use crate::domain::foundation::HandlerId;

/// Identifier recorded on turns produced by the no-match path.
pub const FALLBACK_HANDLER_ID: &str = "fallback";

/// Why no handler was selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum NoMatchReason {
    /// The classifier returned nothing usable.
    Empty,
    /// The classifier named more than one handler.
    Ambiguous(Vec<String>),
    /// The classifier named a handler that does not exist.
    Unknown(String),
    /// The classifier named a handler that exists but is disabled.
    Disabled(HandlerId),
    /// The classifier errored or timed out.
    ClassifierFailed(String),
}

impl fmt::Display for NoMatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoMatchReason::Empty => write!(f, "empty classification"),
            NoMatchReason::Ambiguous(ids) => write!(f, "ambiguous: {}", ids.join(", ")),
            NoMatchReason::Unknown(raw) => write!(f, "unknown handler '{}'", raw),
            NoMatchReason::Disabled(id) => write!(f, "handler '{}' is disabled", id),
            NoMatchReason::ClassifierFailed(err) => write!(f, "classifier failed: {}", err),
        }
    }
}

/// Outcome of routing one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RoutingDecision {
    Selected { handler: HandlerId, kind: HandlerKind },
    NoMatch(NoMatchReason),
}

impl RoutingDecision {
    pub fn fallback_handler_id() -> HandlerId {
        HandlerId::from_static(FALLBACK_HANDLER_ID)
    }

    pub fn is_match(&self) -> bool {
        matches!(self, RoutingDecision::Selected { .. })
    }

    pub fn selected_kind(&self) -> Option<HandlerKind> {
        match self {
            RoutingDecision::Selected { kind, .. } => Some(*kind),
            RoutingDecision::NoMatch(_) => None,
        }
    }
}

/// Turns raw classifier output into a decision against the registry.
///
/// The output is trimmed, unquoted and lowercased; spaces and hyphens count as
/// underscores. A single known identifier found among the words is accepted;
/// two or more distinct ones are ambiguous. Only enabled handlers can be
/// selected.
pub fn interpret_classification(raw: &str, registry: &HandlerRegistry) -> RoutingDecision {
    let cleaned = raw
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`') || c.is_whitespace())
        .to_lowercase();
    if cleaned.is_empty() {
        return RoutingDecision::NoMatch(NoMatchReason::Empty);
    }

    let whole = normalise(&cleaned);
    let candidate = if registry.get(&whole).is_some() {
        whole
    } else {
        let mut named: Vec<String> = Vec::new();
        for word in cleaned.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-')) {
            let word = normalise(word);
            if registry.get(&word).is_some() && !named.contains(&word) {
                named.push(word);
            }
        }
        match named.len() {
            0 => return RoutingDecision::NoMatch(NoMatchReason::Unknown(cleaned)),
            1 => named.remove(0),
            _ => return RoutingDecision::NoMatch(NoMatchReason::Ambiguous(named)),
        }
    };

    match registry.get(&candidate) {
        Some(d) if d.enabled => match d.kind() {
            Some(kind) => RoutingDecision::Selected {
                handler: d.id.clone(),
                kind,
            },
            None => RoutingDecision::NoMatch(NoMatchReason::Unknown(candidate)),
        },
        Some(d) => RoutingDecision::NoMatch(NoMatchReason::Disabled(d.id.clone())),
        None => RoutingDecision::NoMatch(NoMatchReason::Unknown(candidate)),
    }
}

fn normalise(word: &str) -> String {
    word.trim()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}
