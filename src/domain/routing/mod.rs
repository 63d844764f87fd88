//! Routing module - handler descriptors, the immutable registry built from
//! configuration, and the categorical routing decision.

mod decision;
mod descriptor;
mod prompt;
mod registry;

pub use decision::{interpret_classification, NoMatchReason, RoutingDecision, FALLBACK_HANDLER_ID};
pub use descriptor::{HandlerDescriptor, HandlerKind};
pub use prompt::ClassificationPrompt;
pub use registry::{ConfigurationError, HandlerRegistry};
