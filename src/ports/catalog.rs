//! Per-domain data collaborator ports: products, reviews and orders.

use async_trait::async_trait;

use crate::domain::catalog::{Order, Product, Review};
use crate::domain::foundation::{OrderId, ProductId};

/// Errors surfaced by catalog collaborators.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    #[error("catalog write rejected: {0}")]
    WriteRejected(String),
}

/// Read-only product lookups.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError>;

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError>;
}

/// Review reads and single-statement review writes.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn reviews_for(&self, product: &ProductId) -> Result<Vec<Review>, CatalogError>;

    async fn add_review(&self, review: &Review) -> Result<(), CatalogError>;
}

/// Order creation and lookup.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create_order(&self, order: &Order) -> Result<(), CatalogError>;

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, CatalogError>;
}
