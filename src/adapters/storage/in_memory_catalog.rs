//! In-Memory Catalog Adapter
//!
//! Products, reviews and orders held in memory, seeded from a YAML file.
//! Implements all three catalog ports.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::catalog::{Order, Product, Review};
use crate::domain::foundation::{OrderId, ProductId};
use crate::ports::{CatalogError, OrderStore, ProductCatalog, ReviewStore};

/// Errors loading the seed file.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seed file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Seed file layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl CatalogSeed {
    pub fn from_yaml(yaml: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }
}

/// In-memory products, reviews and orders.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<Vec<Product>>>,
    reviews: Arc<RwLock<Vec<Review>>>,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    fail_writes: Arc<AtomicBool>,
    order_writes: Arc<AtomicUsize>,
    review_writes: Arc<AtomicUsize>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: CatalogSeed) -> Self {
        Self {
            products: Arc::new(RwLock::new(seed.products)),
            reviews: Arc::new(RwLock::new(seed.reviews)),
            ..Self::default()
        }
    }

    /// Makes every write fail with `WriteRejected`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `create_order` calls received, successful or not.
    pub fn order_write_attempts(&self) -> usize {
        self.order_writes.load(Ordering::SeqCst)
    }

    /// Number of `add_review` calls received, successful or not.
    pub fn review_write_attempts(&self) -> usize {
        self.review_writes.load(Ordering::SeqCst)
    }

    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    fn check_writable(&self) -> Result<(), CatalogError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CatalogError::WriteRejected("catalog is read-only".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.read().await.clone())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }
}

#[async_trait]
impl ReviewStore for InMemoryCatalog {
    async fn reviews_for(&self, product: &ProductId) -> Result<Vec<Review>, CatalogError> {
        Ok(self
            .reviews
            .read()
            .await
            .iter()
            .filter(|r| &r.product_id == product)
            .cloned()
            .collect())
    }

    async fn add_review(&self, review: &Review) -> Result<(), CatalogError> {
        self.review_writes.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        self.reviews.write().await.push(review.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryCatalog {
    async fn create_order(&self, order: &Order) -> Result<(), CatalogError> {
        self.order_writes.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.order_id) {
            return Err(CatalogError::WriteRejected(format!(
                "order {} already exists",
                order.order_id
            )));
        }
        orders.insert(order.order_id.clone(), order.clone());
        Ok(())
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, CatalogError> {
        Ok(self.orders.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SEED: &str = r#"
products:
  - id: dream-sleep
    name: Dream Sleep Mattress
    price: 899.0
    type: All-Foam
    available_sizes: [Twin, Queen]
    warranty: 10 years
    trial_period: 100 nights
reviews:
  - product_id: dream-sleep
    customer_id: maria_c
    rating: 5
    content: Great for side sleeping.
    verified_purchase: true
"#;

    #[tokio::test]
    async fn seed_populates_products_and_reviews() {
        let catalog = InMemoryCatalog::from_seed(CatalogSeed::from_yaml(SEED).unwrap());
        let id = ProductId::new("dream-sleep").unwrap();
        assert_eq!(catalog.list_products().await.unwrap().len(), 1);
        assert!(catalog.get_product(&id).await.unwrap().is_some());
        assert_eq!(catalog.reviews_for(&id).await.unwrap().len(), 1);
    }

    #[test]
    fn seed_rejects_invalid_rating() {
        let bad = SEED.replace("rating: 5", "rating: 9");
        assert!(CatalogSeed::from_yaml(&bad).is_err());
    }

    #[test]
    fn seed_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();
        let seed = CatalogSeed::from_file(file.path()).unwrap();
        assert_eq!(seed.products[0].name, "Dream Sleep Mattress");
    }

    #[test]
    fn missing_seed_file_is_io_error() {
        let err = CatalogSeed::from_file("/nonexistent/catalog.yaml").unwrap_err();
        assert!(matches!(err, SeedError::Io { .. }));
    }

    #[test]
    fn bundled_seed_file_parses() {
        let seed = CatalogSeed::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/data/catalog.yaml")).unwrap();
        assert_eq!(seed.products.len(), 6);
        assert_eq!(seed.reviews.len(), 50);
    }

    #[tokio::test]
    async fn failing_writes_are_counted_and_rejected() {
        let catalog = InMemoryCatalog::from_seed(CatalogSeed::from_yaml(SEED).unwrap());
        catalog.set_fail_writes(true);
        let review = crate::domain::catalog::NewReview::new("dream-sleep", 4, "Nice")
            .unwrap()
            .into_review();
        assert!(catalog.add_review(&review).await.is_err());
        assert_eq!(catalog.review_write_attempts(), 1);
        let id = ProductId::new("dream-sleep").unwrap();
        assert_eq!(catalog.reviews_for(&id).await.unwrap().len(), 1);
    }
}
