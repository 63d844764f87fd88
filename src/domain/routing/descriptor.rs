//! Handler descriptors and the closed set of handler kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::HandlerId;

/// The closed set of domain handlers this service knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Product,
    Reviews,
    Orders,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 3] = [HandlerKind::Product, HandlerKind::Reviews, HandlerKind::Orders];

    /// Configuration identifier for this kind.
    pub fn id_str(&self) -> &'static str {
        match self {
            HandlerKind::Product => "product_details",
            HandlerKind::Reviews => "reviews",
            HandlerKind::Orders => "orders",
        }
    }

    /// Maps a configured identifier onto its kind.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id_str() == id)
    }

    pub fn handler_id(&self) -> HandlerId {
        HandlerId::from_static(self.id_str())
    }

    /// Descriptor used when configuration does not list handlers.
    pub fn default_descriptor(&self) -> HandlerDescriptor {
        let (name, description) = match self {
            HandlerKind::Product => (
                "Product Details",
                "Answers questions about mattress models: features, materials, \
                 construction layers, available sizes, prices, warranty and trial \
                 period, and compares products side by side.",
            ),
            HandlerKind::Reviews => (
                "Reviews",
                "Shows customer reviews and rating statistics for a product, \
                 filters positive or negative feedback, and records a new review \
                 from the customer.",
            ),
            HandlerKind::Orders => (
                "Orders",
                "Places new orders (product, size, quantity, delivery address, \
                 payment method) and looks up the status of an existing order.",
            ),
        };
        HandlerDescriptor {
            id: self.handler_id(),
            name: name.to_string(),
            description: description.to_string(),
            enabled: true,
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id_str())
    }
}

/// A handler as declared in configuration.
///
/// The description is passed verbatim to the classification step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerDescriptor {
    pub id: HandlerId,
    pub name: String,
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl HandlerDescriptor {
    pub fn kind(&self) -> Option<HandlerKind> {
        HandlerKind::from_id(self.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_ids() {
        for kind in HandlerKind::ALL {
            assert_eq!(HandlerKind::from_id(kind.id_str()), Some(kind));
        }
        assert_eq!(HandlerKind::from_id("billing"), None);
    }

    #[test]
    fn default_descriptors_are_enabled_and_described() {
        for kind in HandlerKind::ALL {
            let d = kind.default_descriptor();
            assert!(d.enabled);
            assert!(!d.description.trim().is_empty());
            assert_eq!(d.kind(), Some(kind));
        }
    }

    #[test]
    fn descriptor_enabled_defaults_to_true_when_omitted() {
        let yaml = "id: reviews\nname: Reviews\ndescription: Product reviews\n";
        let d: HandlerDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert!(d.enabled);
    }
}
