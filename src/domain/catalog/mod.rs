//! Catalog module - products, reviews and orders the support handlers talk about.

mod order;
mod product;
mod review;

pub use order::{
    BedSize, Order, OrderRequest, OrderStatus, PaymentMethod, ValidOrderRequest, ESTIMATED_DELIVERY,
    MAX_ORDER_QUANTITY,
};
pub use product::{resolve_product, Product};
pub use review::{NewReview, Review, ReviewFilter, ReviewStats};

#[cfg(test)]
pub(crate) use product::tests::product as sample_product;
