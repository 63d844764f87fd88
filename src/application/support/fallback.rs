//! Fallback handler for messages no enabled handler claims.

use super::HandlerReply;
use crate::domain::routing::HandlerRegistry;

/// Answers no-match decisions with a rephrase prompt naming what we can help with.
///
/// Never fails and never produces an error turn.
pub struct FallbackHandler {
    reply: String,
}

impl FallbackHandler {
    pub fn new(registry: &HandlerRegistry) -> Self {
        let topics: Vec<String> = registry
            .enabled_handlers()
            .iter()
            .map(|d| d.name.to_lowercase())
            .collect();
        Self {
            reply: format!(
                "I didn't understand; could you rephrase or ask about {}?",
                join_alternatives(&topics)
            ),
        }
    }

    pub fn respond(&self) -> HandlerReply {
        HandlerReply::no_match(self.reply.clone())
    }
}

fn join_alternatives(items: &[String]) -> String {
    match items {
        [] => "something else".to_string(),
        [one] => one.clone(),
        [a, b] => format!("{} or {}", a, b),
        [rest @ .., last] => format!("{}, or {}", rest.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::support::ReplyOutcome;
    use crate::domain::routing::{HandlerDescriptor, HandlerKind};

    #[test]
    fn names_every_enabled_handler() {
        let reply = FallbackHandler::new(&HandlerRegistry::with_defaults()).respond();

        assert_eq!(
            reply.content,
            "I didn't understand; could you rephrase or ask about product details, reviews, or orders?"
        );
        assert_eq!(reply.outcome, ReplyOutcome::NoMatch);
        assert_eq!(reply.error_kind(), None);
    }

    #[test]
    fn skips_disabled_handlers() {
        let mut descriptors: Vec<HandlerDescriptor> =
            HandlerKind::ALL.iter().map(HandlerKind::default_descriptor).collect();
        descriptors[0].enabled = false;
        let registry = HandlerRegistry::new(descriptors).unwrap();

        let reply = FallbackHandler::new(&registry).respond();

        assert!(reply.content.ends_with("ask about reviews or orders?"));
    }
}
