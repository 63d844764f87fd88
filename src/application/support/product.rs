//! Product handler - read-only answers about mattress models.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::{ToolHandler, ToolOutcome};
use crate::domain::catalog::{resolve_product, Product};
use crate::domain::routing::HandlerKind;
use crate::ports::{ProductCatalog, ToolCall, ToolDefinition};

pub struct ProductHandler {
    products: Arc<dyn ProductCatalog>,
}

impl ProductHandler {
    pub fn new(products: Arc<dyn ProductCatalog>) -> Self {
        Self { products }
    }

    async fn catalog(&self) -> Result<Vec<Product>, ToolOutcome> {
        self.products.list_products().await.map_err(|err| {
            tracing::error!(error = %err, "Product catalog read failed");
            ToolOutcome::DataAccess(
                "I couldn't reach our product catalog just now. Please try again in a moment.".to_string(),
            )
        })
    }

    async fn product_details(&self, call: &ToolCall) -> ToolOutcome {
        let Some(reference) = call.str_arg("product_id") else {
            return ToolOutcome::Invalid("Please tell me which mattress you'd like details about.".to_string());
        };
        let catalog = match self.catalog().await {
            Ok(catalog) => catalog,
            Err(outcome) => return outcome,
        };
        match resolve_product(reference, &catalog) {
            Some(product) => ToolOutcome::Done {
                data: json!(product),
                rendered: render_details(product),
                effect: None,
            },
            None => ToolOutcome::NotFound(not_found_text(&[reference], &catalog)),
        }
    }

    async fn compare(&self, call: &ToolCall) -> ToolOutcome {
        let references: Vec<&str> = call
            .arguments
            .get("product_ids")
            .and_then(|v| v.as_array())
            .map(|ids| ids.iter().filter_map(|v| v.as_str()).map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        if references.is_empty() {
            return ToolOutcome::Invalid("Please name the mattresses you'd like to compare.".to_string());
        }
        let catalog = match self.catalog().await {
            Ok(catalog) => catalog,
            Err(outcome) => return outcome,
        };

        let mut found: Vec<&Product> = Vec::new();
        let mut missing: Vec<&str> = Vec::new();
        for reference in &references {
            match resolve_product(reference, &catalog) {
                Some(p) if !found.iter().any(|f| f.id == p.id) => found.push(p),
                Some(_) => {}
                None => missing.push(*reference),
            }
        }
        if !missing.is_empty() {
            return ToolOutcome::NotFound(not_found_text(&missing, &catalog));
        }

        let rendered = found
            .iter()
            .map(|p| render_details(p))
            .collect::<Vec<_>>()
            .join("\n\n");
        ToolOutcome::Done {
            data: json!({ "products": found }),
            rendered,
            effect: None,
        }
    }
}

#[async_trait]
impl ToolHandler for ProductHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Product
    }

    async fn instructions(&self) -> String {
        let summary = match self.products.list_products().await {
            Ok(products) => products.iter().map(|p| format!("- {}", p.summary_line())).collect::<Vec<_>>().join("\n"),
            Err(err) => {
                tracing::warn!(error = %err, "Catalog summary unavailable");
                "(catalog currently unavailable)".to_string()
            }
        };
        format!(
            "You are the product specialist for a mattress store's customer support. \
             Answer questions about our mattresses: features, materials, construction, \
             sizes, prices, warranty and trial period. Use the tools to look up exact \
             details rather than guessing, and be friendly and concise.\n\n\
             Our products:\n{}",
            summary
        )
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "get_product_details",
                "Get detailed information about a specific mattress",
                json!({
                    "type": "object",
                    "properties": {
                        "product_id": {
                            "type": "string",
                            "description": "Product id or name, e.g. 'luxury-cloud' or 'Luxury Cloud Mattress'"
                        }
                    },
                    "required": ["product_id"]
                }),
            ),
            ToolDefinition::new(
                "compare_products",
                "Compare two or more mattresses side by side",
                json!({
                    "type": "object",
                    "properties": {
                        "product_ids": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Product ids or names to compare"
                        }
                    },
                    "required": ["product_ids"]
                }),
            ),
        ]
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        match call.name.as_str() {
            "get_product_details" => self.product_details(call).await,
            "compare_products" => self.compare(call).await,
            other => ToolOutcome::Invalid(format!("Unsupported request '{}'.", other)),
        }
    }
}

fn render_details(p: &Product) -> String {
    let mut out = format!("{} - ${:.2}\nType: {}", p.name, p.price, p.product_type);
    if let Some(height) = &p.height {
        out.push_str(&format!("\nHeight: {}", height));
    }
    if !p.key_features.is_empty() {
        out.push_str(&format!("\nKey features: {}", p.key_features.join(", ")));
    }
    if !p.best_for.is_empty() {
        out.push_str(&format!("\nBest for: {}", p.best_for.join(", ")));
    }
    out.push_str(&format!(
        "\nSizes: {}\nWarranty: {}\nTrial period: {}",
        p.available_sizes.join(", "),
        p.warranty,
        p.trial_period
    ));
    out
}

fn not_found_text(missing: &[&str], catalog: &[Product]) -> String {
    let names: Vec<&str> = catalog.iter().map(|p| p.name.as_str()).collect();
    format!(
        "I couldn't find a product matching {}. Our available mattresses are: {}.",
        missing.iter().map(|m| format!("'{}'", m)).collect::<Vec<_>>().join(", "),
        names.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::{CatalogSeed, InMemoryCatalog};
    use crate::domain::catalog::sample_product as product;

    fn handler() -> ProductHandler {
        let seed = CatalogSeed {
            products: vec![
                product("luxury-cloud", "Luxury Cloud Mattress", 1299.0, &["Queen", "King"]),
                product("essential-foam", "Essential Foam Mattress", 599.0, &["Twin", "Full", "Queen"]),
            ],
            reviews: Vec::new(),
        };
        ProductHandler::new(Arc::new(InMemoryCatalog::from_seed(seed)))
    }

    #[tokio::test]
    async fn details_resolve_by_name() {
        let call = ToolCall::new("get_product_details", json!({"product_id": "luxury cloud"}));

        let outcome = handler().execute(&call).await;

        match outcome {
            ToolOutcome::Done { data, rendered, .. } => {
                assert_eq!(data["id"], "luxury-cloud");
                assert!(rendered.starts_with("Luxury Cloud Mattress - $1299.00"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_product_lists_available_names() {
        let call = ToolCall::new("get_product_details", json!({"product_id": "waterbed"}));

        let outcome = handler().execute(&call).await;

        assert_eq!(
            outcome,
            ToolOutcome::NotFound(
                "I couldn't find a product matching 'waterbed'. Our available mattresses are: \
                 Luxury Cloud Mattress, Essential Foam Mattress."
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn compare_reports_missing_references_together() {
        let call = ToolCall::new(
            "compare_products",
            json!({"product_ids": ["luxury-cloud", "hammock", "futon"]}),
        );

        let outcome = handler().execute(&call).await;

        match outcome {
            ToolOutcome::NotFound(text) => {
                assert!(text.contains("'hammock', 'futon'"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn compare_returns_every_product() {
        let call = ToolCall::new(
            "compare_products",
            json!({"product_ids": ["luxury-cloud", "essential-foam"]}),
        );

        let outcome = handler().execute(&call).await;

        match outcome {
            ToolOutcome::Done { data, .. } => assert_eq!(data["products"].as_array().map(Vec::len), Some(2)),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn instructions_include_catalog_summary() {
        let text = handler().instructions().await;

        assert!(text.contains("Essential Foam Mattress (id: essential-foam)"));
    }
}
