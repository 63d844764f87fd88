//! Support handlers - the domain handlers a routing decision dispatches to.
//!
//! Each domain handler owns a tool set and a system prompt. The shared
//! [`Composer`] runs the model round trip; handlers only execute tools against
//! the catalog collaborators and report a [`ToolOutcome`].

mod composer;
mod fallback;
mod orders;
mod product;
mod reviews;

pub use composer::{Composer, UPSTREAM_APOLOGY};
pub use fallback::FallbackHandler;
pub use orders::OrdersHandler;
pub use product::ProductHandler;
pub use reviews::ReviewsHandler;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::domain::conversation::{Turn, TurnErrorKind, TurnHistory};
use crate::domain::foundation::{HandlerId, OrderId, ProductId, ValidationError};
use crate::domain::routing::{HandlerKind, HandlerRegistry, RoutingDecision};
use crate::ports::{OrderStore, ProductCatalog, ReviewStore, ToolCall, ToolDefinition};

// ════════════════════════════════════════════════════════════════════════════════
// Replies
// ════════════════════════════════════════════════════════════════════════════════

/// What a handler's reply means, independent of its wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyOutcome {
    Answered,
    NotFound,
    NoMatch,
    Invalid,
    DataAccess,
    Upstream,
}

/// A write a handler performed while answering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum SideEffect {
    OrderCreated(OrderId),
    ReviewRecorded(ProductId),
}

/// Reply produced by a handler for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerReply {
    pub content: String,
    pub outcome: ReplyOutcome,
    pub side_effects: Vec<SideEffect>,
}

impl HandlerReply {
    fn new(content: impl Into<String>, outcome: ReplyOutcome) -> Self {
        Self {
            content: content.into(),
            outcome,
            side_effects: Vec::new(),
        }
    }

    pub fn answered(content: impl Into<String>) -> Self {
        Self::new(content, ReplyOutcome::Answered)
    }

    pub fn not_found(content: impl Into<String>) -> Self {
        Self::new(content, ReplyOutcome::NotFound)
    }

    pub fn no_match(content: impl Into<String>) -> Self {
        Self::new(content, ReplyOutcome::NoMatch)
    }

    pub fn invalid(content: impl Into<String>) -> Self {
        Self::new(content, ReplyOutcome::Invalid)
    }

    pub fn data_access(content: impl Into<String>) -> Self {
        Self::new(content, ReplyOutcome::DataAccess)
    }

    pub fn upstream() -> Self {
        Self::new(UPSTREAM_APOLOGY, ReplyOutcome::Upstream)
    }

    pub fn with_side_effect(mut self, effect: SideEffect) -> Self {
        self.side_effects.push(effect);
        self
    }

    /// Error kind of the turn this reply becomes, if it is an error turn.
    pub fn error_kind(&self) -> Option<TurnErrorKind> {
        match self.outcome {
            ReplyOutcome::Invalid => Some(TurnErrorKind::Validation),
            ReplyOutcome::DataAccess => Some(TurnErrorKind::DataAccess),
            ReplyOutcome::Upstream => Some(TurnErrorKind::Upstream),
            ReplyOutcome::Answered | ReplyOutcome::NotFound | ReplyOutcome::NoMatch => None,
        }
    }

    /// Converts the reply into the turn recorded for it.
    pub fn into_turn(self, handler: HandlerId) -> Turn {
        match self.error_kind() {
            Some(kind) => Turn::error(self.content, kind, Some(handler)),
            None => Turn::assistant(self.content, handler),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Tool execution
// ════════════════════════════════════════════════════════════════════════════════

/// Result of executing one tool call against the collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// The tool ran. `data` is shown to the model for phrasing; `rendered` is
    /// the plain rendering used when phrasing is unavailable.
    Done {
        data: serde_json::Value,
        rendered: String,
        effect: Option<SideEffect>,
    },
    NotFound(String),
    Invalid(String),
    DataAccess(String),
}

/// A handler whose answers come from a model with a tool set.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn kind(&self) -> HandlerKind;

    /// Domain system prompt, including a catalog summary.
    async fn instructions(&self) -> String;

    fn tools(&self) -> Vec<ToolDefinition>;

    async fn execute(&self, call: &ToolCall) -> ToolOutcome;
}

/// Integer tool argument; models send numbers, integral floats or strings.
pub(crate) fn int_arg(call: &ToolCall, key: &str) -> Result<Option<i64>, ValidationError> {
    match call.arguments.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| ValidationError::invalid_format(key, "must be a whole number")),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ValidationError::invalid_format(key, "must be a whole number")),
        Some(_) => Err(ValidationError::invalid_format(key, "must be a whole number")),
    }
}

/// Renders validation problems for an error turn.
pub(crate) fn describe_errors<E: std::fmt::Display>(intro: &str, errors: &[E]) -> String {
    let mut out = String::from(intro);
    for e in errors {
        out.push_str("\n- ");
        out.push_str(&e.to_string());
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════════
// Dispatch
// ════════════════════════════════════════════════════════════════════════════════

/// One handler the pipeline can dispatch to.
pub enum SupportHandler {
    Product(ProductHandler),
    Reviews(ReviewsHandler),
    Orders(OrdersHandler),
    Fallback(FallbackHandler),
}

impl SupportHandler {
    pub fn handler_id(&self) -> HandlerId {
        match self {
            SupportHandler::Product(h) => h.kind().handler_id(),
            SupportHandler::Reviews(h) => h.kind().handler_id(),
            SupportHandler::Orders(h) => h.kind().handler_id(),
            SupportHandler::Fallback(_) => RoutingDecision::fallback_handler_id(),
        }
    }

    pub async fn respond(&self, composer: &Composer, message: &str, history: &TurnHistory) -> HandlerReply {
        match self {
            SupportHandler::Product(h) => composer.respond(h, message, history).await,
            SupportHandler::Reviews(h) => composer.respond(h, message, history).await,
            SupportHandler::Orders(h) => composer.respond(h, message, history).await,
            SupportHandler::Fallback(h) => h.respond(),
        }
    }
}

/// Catalog collaborators shared by the domain handlers.
#[derive(Clone)]
pub struct Collaborators {
    pub products: Arc<dyn ProductCatalog>,
    pub reviews: Arc<dyn ReviewStore>,
    pub orders: Arc<dyn OrderStore>,
}

/// The enabled handlers plus the fallback, built once from the registry.
pub struct HandlerSet {
    composer: Composer,
    handlers: Vec<SupportHandler>,
    fallback: SupportHandler,
}

impl HandlerSet {
    /// Instantiates a handler for every enabled registry entry.
    pub fn new(registry: &HandlerRegistry, collaborators: Collaborators, composer: Composer) -> Self {
        let handlers = registry
            .enabled_kinds()
            .into_iter()
            .map(|kind| match kind {
                HandlerKind::Product => SupportHandler::Product(ProductHandler::new(collaborators.products.clone())),
                HandlerKind::Reviews => SupportHandler::Reviews(ReviewsHandler::new(
                    collaborators.products.clone(),
                    collaborators.reviews.clone(),
                )),
                HandlerKind::Orders => SupportHandler::Orders(OrdersHandler::new(
                    collaborators.products.clone(),
                    collaborators.orders.clone(),
                )),
            })
            .collect();
        Self {
            composer,
            handlers,
            fallback: SupportHandler::Fallback(FallbackHandler::new(registry)),
        }
    }

    /// The handler a decision dispatches to. No-match always gets the fallback.
    pub fn select(&self, decision: &RoutingDecision) -> &SupportHandler {
        decision
            .selected_kind()
            .and_then(|kind| {
                self.handlers
                    .iter()
                    .find(|h| h.handler_id().as_str() == kind.id_str())
            })
            .unwrap_or(&self.fallback)
    }

    /// Dispatches `message` and returns the reply with the id it is attributed to.
    pub async fn dispatch(
        &self,
        decision: &RoutingDecision,
        message: &str,
        history: &TurnHistory,
    ) -> (HandlerId, HandlerReply) {
        let handler = self.select(decision);
        let handler_id = handler.handler_id();
        let reply = handler.respond(&self.composer, message, history).await;
        match reply.outcome {
            ReplyOutcome::Invalid | ReplyOutcome::DataAccess | ReplyOutcome::Upstream => {
                tracing::warn!(handler_id = %handler_id, outcome = ?reply.outcome, "Handler replied with an error");
            }
            _ => {
                tracing::info!(handler_id = %handler_id, outcome = ?reply.outcome, "Handler replied");
            }
        }
        (handler_id, reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::Role;

    #[test]
    fn answered_reply_becomes_assistant_turn() {
        let turn = HandlerReply::answered("Here you go").into_turn(HandlerKind::Product.handler_id());

        assert_eq!(turn.role(), Role::Assistant);
        assert_eq!(turn.handler().map(HandlerId::as_str), Some("product_details"));
    }

    #[test]
    fn not_found_is_not_an_error() {
        let turn = HandlerReply::not_found("No such order").into_turn(HandlerKind::Orders.handler_id());

        assert!(!turn.is_error());
    }

    #[test]
    fn failures_become_error_turns_with_kind() {
        let cases = [
            (HandlerReply::invalid("bad size"), TurnErrorKind::Validation),
            (HandlerReply::data_access("write failed"), TurnErrorKind::DataAccess),
            (HandlerReply::upstream(), TurnErrorKind::Upstream),
        ];
        for (reply, kind) in cases {
            let turn = reply.into_turn(HandlerKind::Orders.handler_id());
            assert_eq!(turn.role(), Role::Error);
            assert_eq!(turn.error_kind(), Some(kind));
        }
    }

    fn handler_set(registry: &HandlerRegistry) -> HandlerSet {
        use crate::adapters::ai::MockAIProvider;
        use crate::adapters::storage::InMemoryCatalog;

        let catalog = Arc::new(InMemoryCatalog::new());
        let collaborators = Collaborators {
            products: catalog.clone(),
            reviews: catalog.clone(),
            orders: catalog,
        };
        HandlerSet::new(registry, collaborators, Composer::new(Arc::new(MockAIProvider::new()), 0.7, 5))
    }

    #[test]
    fn no_match_dispatches_to_fallback() {
        use crate::domain::routing::NoMatchReason;

        let set = handler_set(&HandlerRegistry::with_defaults());
        let handler = set.select(&RoutingDecision::NoMatch(NoMatchReason::Empty));

        assert_eq!(handler.handler_id().as_str(), "fallback");
    }

    #[test]
    fn selected_kind_dispatches_to_its_handler() {
        let set = handler_set(&HandlerRegistry::with_defaults());
        let decision = RoutingDecision::Selected {
            handler: HandlerKind::Reviews.handler_id(),
            kind: HandlerKind::Reviews,
        };

        assert_eq!(set.select(&decision).handler_id().as_str(), "reviews");
    }

    #[test]
    fn int_arg_accepts_numbers_and_numeric_strings() {
        let call = ToolCall::new(
            "create_order",
            serde_json::json!({"a": 3, "b": 2.0, "c": " 4 ", "d": "two", "e": 1.5}),
        );

        assert_eq!(int_arg(&call, "a"), Ok(Some(3)));
        assert_eq!(int_arg(&call, "b"), Ok(Some(2)));
        assert_eq!(int_arg(&call, "c"), Ok(Some(4)));
        assert_eq!(int_arg(&call, "missing"), Ok(None));
        assert!(int_arg(&call, "d").is_err());
        assert!(int_arg(&call, "e").is_err());
    }

    #[test]
    fn describe_errors_lists_each_problem() {
        let text = describe_errors("Cannot place order:", &["size missing", "bad payment"]);

        assert_eq!(text, "Cannot place order:\n- size missing\n- bad payment");
    }
}
