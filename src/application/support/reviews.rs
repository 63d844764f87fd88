//! Reviews handler - review listings, rating statistics and new reviews.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::{int_arg, SideEffect, ToolHandler, ToolOutcome};
use crate::domain::catalog::{resolve_product, NewReview, Product, Review, ReviewFilter, ReviewStats};
use crate::domain::routing::HandlerKind;
use crate::ports::{ProductCatalog, ReviewStore, ToolCall, ToolDefinition};

/// Reviews quoted per product in the handler instructions.
const SAMPLE_REVIEWS: usize = 3;

pub struct ReviewsHandler {
    products: Arc<dyn ProductCatalog>,
    reviews: Arc<dyn ReviewStore>,
}

impl ReviewsHandler {
    pub fn new(products: Arc<dyn ProductCatalog>, reviews: Arc<dyn ReviewStore>) -> Self {
        Self { products, reviews }
    }

    /// Resolves the `product_id` argument against the catalog.
    async fn product(&self, call: &ToolCall) -> Result<Product, ToolOutcome> {
        let Some(reference) = call.str_arg("product_id") else {
            return Err(ToolOutcome::Invalid("Please tell me which mattress you mean.".to_string()));
        };
        let catalog = self.products.list_products().await.map_err(|err| {
            tracing::error!(error = %err, "Product catalog read failed");
            unavailable()
        })?;
        resolve_product(reference, &catalog).cloned().ok_or_else(|| {
            let names: Vec<&str> = catalog.iter().map(|p| p.name.as_str()).collect();
            ToolOutcome::NotFound(format!(
                "I couldn't find a product matching '{}'. We have reviews for: {}.",
                reference,
                names.join(", ")
            ))
        })
    }

    async fn reviews_of(&self, product: &Product) -> Result<Vec<Review>, ToolOutcome> {
        self.reviews.reviews_for(&product.id).await.map_err(|err| {
            tracing::error!(product_id = %product.id, error = %err, "Review read failed");
            unavailable()
        })
    }

    async fn list_reviews(&self, call: &ToolCall) -> ToolOutcome {
        let filter = match call.str_arg("filter_type").map(str::parse::<ReviewFilter>) {
            None => ReviewFilter::All,
            Some(Ok(filter)) => filter,
            Some(Err(err)) => return ToolOutcome::Invalid(format!("I can't filter reviews that way: {}.", err)),
        };
        let product = match self.product(call).await {
            Ok(product) => product,
            Err(outcome) => return outcome,
        };
        let reviews: Vec<Review> = match self.reviews_of(&product).await {
            Ok(reviews) => reviews.into_iter().filter(|r| filter.admits(r)).collect(),
            Err(outcome) => return outcome,
        };
        let stats = ReviewStats::from_reviews(&reviews);

        let mut rendered = format!(
            "{} has {} {} review(s) with an average rating of {:.1} stars.",
            product.name,
            stats.total_reviews,
            filter.as_str(),
            stats.average_rating
        );
        for r in reviews.iter().take(5) {
            rendered.push_str(&format!("\n- {}/5: {}", r.rating, r.content));
        }

        ToolOutcome::Done {
            data: json!({
                "product_id": product.id,
                "product_name": product.name,
                "filter_type": filter.as_str(),
                "total_reviews": stats.total_reviews,
                "average_rating": stats.average_rating,
                "reviews": reviews,
            }),
            rendered,
            effect: None,
        }
    }

    async fn review_stats(&self, call: &ToolCall) -> ToolOutcome {
        let product = match self.product(call).await {
            Ok(product) => product,
            Err(outcome) => return outcome,
        };
        let reviews = match self.reviews_of(&product).await {
            Ok(reviews) => reviews,
            Err(outcome) => return outcome,
        };
        let stats = ReviewStats::from_reviews(&reviews);

        let mut rendered = format!(
            "{}: {} review(s), average {:.1} stars, {} verified purchase(s).",
            product.name, stats.total_reviews, stats.average_rating, stats.verified_purchases
        );
        for stars in (1..=5u8).rev() {
            rendered.push_str(&format!("\n{} stars: {}", stars, stats.count_for(stars)));
        }

        ToolOutcome::Done {
            data: json!({
                "product_id": product.id,
                "product_name": product.name,
                "stats": stats,
            }),
            rendered,
            effect: None,
        }
    }

    async fn create_review(&self, call: &ToolCall) -> ToolOutcome {
        let rating = match int_arg(call, "rating") {
            Ok(Some(rating)) => rating,
            Ok(None) => return ToolOutcome::Invalid("Please give a rating from 1 to 5 stars.".to_string()),
            Err(err) => return ToolOutcome::Invalid(format!("I couldn't record that review: {}.", err)),
        };
        let reference = call.str_arg("product_id").unwrap_or_default();
        let content = call.str_arg("content").unwrap_or_default();
        let mut review = match NewReview::new(reference, rating, content) {
            Ok(review) => review,
            Err(err) => return ToolOutcome::Invalid(format!("I couldn't record that review: {}.", err)),
        };
        let product = match self.product(call).await {
            Ok(product) => product,
            Err(outcome) => return outcome,
        };
        review.product_id = product.id.clone();

        let review = review.into_review();
        if let Err(err) = self.reviews.add_review(&review).await {
            tracing::error!(product_id = %product.id, error = %err, "Review write failed");
            return ToolOutcome::DataAccess(format!(
                "I'm sorry, your review of {} could not be saved right now. Nothing was recorded; \
                 please try again later.",
                product.name
            ));
        }
        tracing::info!(product_id = %product.id, rating = %review.rating, "Review recorded");

        ToolOutcome::Done {
            data: json!({
                "success": true,
                "product_id": product.id,
                "product_name": product.name,
                "rating": review.rating,
                "content": review.content,
            }),
            rendered: format!(
                "Thank you! Your {}-star review of {} has been recorded.",
                review.rating, product.name
            ),
            effect: Some(SideEffect::ReviewRecorded(product.id)),
        }
    }
}

fn unavailable() -> ToolOutcome {
    ToolOutcome::DataAccess("I couldn't reach our review records just now. Please try again in a moment.".to_string())
}

#[async_trait]
impl ToolHandler for ReviewsHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Reviews
    }

    async fn instructions(&self) -> String {
        let mut summary = String::new();
        match self.products.list_products().await {
            Ok(products) => {
                for p in &products {
                    let reviews = self.reviews.reviews_for(&p.id).await.unwrap_or_default();
                    let stats = ReviewStats::from_reviews(&reviews);
                    summary.push_str(&format!(
                        "- {} (id: {}): {} reviews, average {:.1}\n",
                        p.name, p.id, stats.total_reviews, stats.average_rating
                    ));
                    for r in reviews.iter().take(SAMPLE_REVIEWS) {
                        summary.push_str(&format!("  - {}/5: {}\n", r.rating, r.content));
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Catalog summary unavailable");
                summary.push_str("(catalog currently unavailable)\n");
            }
        }
        format!(
            "You are the reviews specialist for a mattress store's customer support. \
             Share what customers say about our mattresses, summarise ratings, and help \
             customers leave a review. A review needs a product, a rating from 1 to 5 \
             and some text; ask for anything missing before calling create_review.\n\n\
             Review overview:\n{}",
            summary
        )
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "get_product_reviews",
                "Get customer reviews for a mattress, optionally only positive or negative ones",
                json!({
                    "type": "object",
                    "properties": {
                        "product_id": { "type": "string", "description": "Product id or name" },
                        "filter_type": {
                            "type": "string",
                            "enum": ["all", "positive", "negative"],
                            "description": "positive is 4-5 stars, negative is 1-2 stars"
                        }
                    },
                    "required": ["product_id"]
                }),
            ),
            ToolDefinition::new(
                "get_review_stats",
                "Get rating statistics for a mattress",
                json!({
                    "type": "object",
                    "properties": {
                        "product_id": { "type": "string", "description": "Product id or name" }
                    },
                    "required": ["product_id"]
                }),
            ),
            ToolDefinition::new(
                "create_review",
                "Record a new customer review",
                json!({
                    "type": "object",
                    "properties": {
                        "product_id": { "type": "string", "description": "Product id or name" },
                        "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                        "content": { "type": "string", "description": "The review text" }
                    },
                    "required": ["product_id", "rating", "content"]
                }),
            ),
        ]
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        match call.name.as_str() {
            "get_product_reviews" => self.list_reviews(call).await,
            "get_review_stats" => self.review_stats(call).await,
            "create_review" => self.create_review(call).await,
            other => ToolOutcome::Invalid(format!("Unsupported request '{}'.", other)),
        }
    }
}
