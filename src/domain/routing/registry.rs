//! Immutable registry of handlers built once from configuration.

use std::collections::HashSet;
use thiserror::Error;

use super::{HandlerDescriptor, HandlerKind};
use crate::domain::foundation::HandlerId;

/// Invalid handler configuration. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("No handlers are enabled; at least one must be")]
    NoEnabledHandlers,

    #[error("Handler '{0}' is declared more than once")]
    DuplicateHandler(HandlerId),

    #[error("Handler '{0}' is not a known handler (expected one of: product_details, reviews, orders)")]
    UnknownHandler(HandlerId),

    #[error("Handler '{0}' has an empty {1}")]
    MissingText(HandlerId, &'static str),
}

/// The configured handlers, in declaration order.
///
/// Read-only after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct HandlerRegistry {
    descriptors: Vec<HandlerDescriptor>,
}

impl HandlerRegistry {
    /// Validates descriptors and builds the registry.
    ///
    /// # Errors
    ///
    /// - `DuplicateHandler` if an id appears twice
    /// - `UnknownHandler` if an id does not map to a handler kind
    /// - `MissingText` if a name or description is blank
    /// - `NoEnabledHandlers` if every descriptor is disabled (or none given)
    pub fn new(descriptors: Vec<HandlerDescriptor>) -> Result<Self, ConfigurationError> {
        let mut seen = HashSet::new();
        for d in &descriptors {
            if !seen.insert(d.id.clone()) {
                return Err(ConfigurationError::DuplicateHandler(d.id.clone()));
            }
            if d.kind().is_none() {
                return Err(ConfigurationError::UnknownHandler(d.id.clone()));
            }
            if d.name.trim().is_empty() {
                return Err(ConfigurationError::MissingText(d.id.clone(), "name"));
            }
            if d.description.trim().is_empty() {
                return Err(ConfigurationError::MissingText(d.id.clone(), "description"));
            }
        }
        if !descriptors.iter().any(|d| d.enabled) {
            return Err(ConfigurationError::NoEnabledHandlers);
        }
        Ok(Self { descriptors })
    }

    /// Registry with every built-in handler enabled.
    pub fn with_defaults() -> Self {
        Self {
            descriptors: HandlerKind::ALL
                .iter()
                .map(HandlerKind::default_descriptor)
                .collect(),
        }
    }

    /// Descriptors with `enabled = true`, in declaration order.
    pub fn enabled_handlers(&self) -> Vec<&HandlerDescriptor> {
        self.descriptors.iter().filter(|d| d.enabled).collect()
    }

    pub fn get(&self, id: &str) -> Option<&HandlerDescriptor> {
        self.descriptors.iter().find(|d| d.id.as_str() == id)
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.get(id).map(|d| d.enabled).unwrap_or(false)
    }

    pub fn enabled_kinds(&self) -> Vec<HandlerKind> {
        self.enabled_handlers()
            .into_iter()
            .filter_map(HandlerDescriptor::kind)
            .collect()
    }
}
