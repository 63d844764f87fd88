//! Product entity and fuzzy product reference resolution.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::foundation::ProductId;

/// A mattress model offered by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub product_type: String,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub construction_layers: Vec<String>,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub best_for: Vec<String>,
    #[serde(default)]
    pub available_sizes: Vec<String>,
    pub warranty: String,
    pub trial_period: String,
}

impl Product {
    pub fn offers_size(&self, size: &str) -> bool {
        self.available_sizes.iter().any(|s| s == size)
    }

    /// One-line summary used in handler instructions.
    pub fn summary_line(&self) -> String {
        format!(
            "{} (id: {}) - ${:.2}, {}; sizes: {}",
            self.name,
            self.id,
            self.price,
            self.product_type,
            self.available_sizes.join(", ")
        )
    }
}

/// Resolves a customer-typed product reference against the catalog.
///
/// Tries, in order: exact id, exact name (case-insensitive), partial kebab-case
/// id with a trailing "-mattress" ignored, then at least half of the reference's
/// words appearing in a product name.
pub fn resolve_product<'a>(reference: &str, products: &'a [Product]) -> Option<&'a Product> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if let Some(p) = products.iter().find(|p| p.id.as_str() == reference) {
        return Some(p);
    }

    let lowered = reference.to_lowercase();
    if let Some(p) = products.iter().find(|p| p.name.to_lowercase() == lowered) {
        return Some(p);
    }

    let kebab = lowered.split_whitespace().collect::<Vec<_>>().join("-");
    let kebab = kebab.trim_end_matches("-mattress");
    if !kebab.is_empty() {
        if let Some(p) = products.iter().find(|p| {
            let id = p.id.as_str().to_lowercase();
            let id = id.trim_end_matches("-mattress");
            id.contains(kebab) || kebab.contains(id)
        }) {
            return Some(p);
        }
    }

    let words: HashSet<&str> = lowered.split_whitespace().collect();
    products
        .iter()
        .map(|p| {
            let name = p.name.to_lowercase();
            let name_words: HashSet<&str> = name.split_whitespace().collect();
            let overlap = words.iter().filter(|w| name_words.contains(*w)).count();
            (p, overlap)
        })
        .filter(|(_, overlap)| *overlap * 2 >= words.len() && *overlap > 0)
        .max_by_key(|(_, overlap)| *overlap)
        .map(|(p, _)| p)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn product(id: &str, name: &str, price: f64, sizes: &[&str]) -> Product {
        Product {
            id: ProductId::new(id).unwrap(),
            name: name.to_string(),
            price,
            product_type: "Hybrid".to_string(),
            height: None,
            construction_layers: vec![],
            key_features: vec![],
            best_for: vec![],
            available_sizes: sizes.iter().map(|s| s.to_string()).collect(),
            warranty: "10 years".to_string(),
            trial_period: "100 nights".to_string(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("ultra-comfort-mattress", "Ultra Comfort Mattress", 1299.0, &["Queen"]),
            product("dream-sleep", "Dream Sleep Mattress", 899.0, &["Twin", "Queen"]),
            product("luxury-cloud", "Luxury Cloud Mattress", 1899.0, &["King"]),
        ]
    }

    #[test]
    fn resolves_exact_id() {
        let products = catalog();
        assert_eq!(resolve_product("dream-sleep", &products).unwrap().name, "Dream Sleep Mattress");
    }

    #[test]
    fn resolves_name_case_insensitively() {
        let products = catalog();
        let p = resolve_product("luxury cloud mattress", &products).unwrap();
        assert_eq!(p.id.as_str(), "luxury-cloud");
    }

    #[test]
    fn resolves_partial_kebab_reference() {
        let products = catalog();
        let p = resolve_product("Ultra Comfort", &products).unwrap();
        assert_eq!(p.id.as_str(), "ultra-comfort-mattress");
    }

    #[test]
    fn resolves_by_word_overlap() {
        let products = catalog();
        let p = resolve_product("the cloud one", &products);
        assert!(p.is_none(), "one of three words is below the overlap threshold");
        let p = resolve_product("cloud luxury", &products).unwrap();
        assert_eq!(p.id.as_str(), "luxury-cloud");
    }

    #[test]
    fn unknown_reference_is_none() {
        let products = catalog();
        assert!(resolve_product("waterbed", &products).is_none());
        assert!(resolve_product("  ", &products).is_none());
    }

    #[test]
    fn offers_size_is_exact() {
        let p = &catalog()[1];
        assert!(p.offers_size("Twin"));
        assert!(!p.offers_size("King"));
    }
}
