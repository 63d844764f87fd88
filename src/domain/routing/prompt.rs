//! Structured classification request handed to the classification collaborator.

use std::fmt::Write;

use super::HandlerDescriptor;
use crate::domain::conversation::{Role, Turn};

/// Everything the classifier may look at for one decision.
#[derive(Debug, Clone)]
pub struct ClassificationPrompt {
    /// Enabled handlers only, in registry order.
    pub candidates: Vec<HandlerDescriptor>,
    /// Trailing window of prior turns, oldest first.
    pub history: Vec<Turn>,
    pub message: String,
}

impl ClassificationPrompt {
    pub fn new(candidates: Vec<HandlerDescriptor>, history: Vec<Turn>, message: impl Into<String>) -> Self {
        Self {
            candidates,
            history,
            message: message.into(),
        }
    }

    pub fn candidate_ids(&self) -> Vec<&str> {
        self.candidates.iter().map(|d| d.id.as_str()).collect()
    }

    /// Routing instructions listing every candidate with its description verbatim.
    pub fn instructions(&self) -> String {
        let mut out = String::from(
            "You are the routing assistant for a mattress store's customer support. \
             Pick exactly one handler for the customer's latest message, using the \
             conversation so far for context. Reply by calling route_to_handler.\n\n\
             Available handlers:\n",
        );
        for d in &self.candidates {
            let _ = writeln!(out, "- {} (id: {}): {}", d.name, d.id, d.description);
        }
        out
    }

    /// Prior turns rendered as a transcript, skipping system and error turns.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for turn in &self.history {
            let speaker = match turn.role() {
                Role::User => "Customer",
                Role::Assistant => "Assistant",
                Role::System | Role::Error => continue,
            };
            let _ = writeln!(out, "{}: {}", speaker, turn.content());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::HandlerId;
    use crate::domain::routing::HandlerKind;

    #[test]
    fn instructions_include_descriptions_verbatim() {
        let product = HandlerKind::Product.default_descriptor();
        let prompt = ClassificationPrompt::new(vec![product.clone()], vec![], "hi");
        let text = prompt.instructions();
        assert!(text.contains(&product.description));
        assert!(text.contains("(id: product_details)"));
        assert_eq!(prompt.candidate_ids(), vec!["product_details"]);
    }

    #[test]
    fn transcript_skips_system_turns() {
        let history = vec![
            Turn::system("Welcome"),
            Turn::user("Do you sell king beds?").unwrap(),
            Turn::assistant("Yes", HandlerId::new("product_details").unwrap()),
        ];
        let prompt = ClassificationPrompt::new(vec![], history, "price?");
        assert_eq!(
            prompt.transcript(),
            "Customer: Do you sell king beds?\nAssistant: Yes\n"
        );
    }
}
