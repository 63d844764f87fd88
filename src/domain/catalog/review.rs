//! Review entity, filtering and aggregate statistics.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::{ProductId, StarRating, Timestamp, ValidationError};

/// A customer review of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub product_id: ProductId,
    #[serde(default = "anonymous")]
    pub customer_id: String,
    pub rating: StarRating,
    pub content: String,
    #[serde(default)]
    pub verified_purchase: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

fn anonymous() -> String {
    "anonymous".to_string()
}

/// A review submitted through the chat, validated before any write.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub product_id: ProductId,
    pub rating: StarRating,
    pub content: String,
}

impl NewReview {
    /// # Errors
    ///
    /// - `OutOfRange` if rating is not 1-5
    /// - `EmptyField` if content or product id is blank
    pub fn new(product_id: &str, rating: i64, content: &str) -> Result<Self, ValidationError> {
        let product_id = ProductId::new(product_id)?;
        let rating = StarRating::try_new(rating)?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ValidationError::empty_field("content"));
        }
        Ok(Self {
            product_id,
            rating,
            content: content.to_string(),
        })
    }

    /// Chat-submitted reviews are recorded as verified purchases.
    pub fn into_review(self) -> Review {
        Review {
            product_id: self.product_id,
            customer_id: anonymous(),
            rating: self.rating,
            content: self.content,
            verified_purchase: true,
            created_at: Some(Timestamp::now()),
        }
    }
}

/// Which reviews to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewFilter {
    #[default]
    All,
    /// Four stars and above.
    Positive,
    /// Two stars and below.
    Negative,
}

impl ReviewFilter {
    pub fn admits(&self, review: &Review) -> bool {
        match self {
            ReviewFilter::All => true,
            ReviewFilter::Positive => review.rating.is_positive(),
            ReviewFilter::Negative => review.rating.is_negative(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewFilter::All => "all",
            ReviewFilter::Positive => "positive",
            ReviewFilter::Negative => "negative",
        }
    }
}

impl FromStr for ReviewFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(ReviewFilter::All),
            "positive" => Ok(ReviewFilter::Positive),
            "negative" => Ok(ReviewFilter::Negative),
            _ => Err(ValidationError::not_allowed(
                "filter_type",
                &["all", "positive", "negative"],
            )),
        }
    }
}

/// Aggregate view of a product's reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewStats {
    pub total_reviews: usize,
    pub average_rating: f64,
    /// Count per star, index 0 is one star.
    pub distribution: [usize; 5],
    pub verified_purchases: usize,
}

impl ReviewStats {
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut distribution = [0usize; 5];
        let mut sum = 0u32;
        for r in reviews {
            distribution[(r.rating.value() - 1) as usize] += 1;
            sum += r.rating.value() as u32;
        }
        let total_reviews = reviews.len();
        Self {
            total_reviews,
            average_rating: if total_reviews == 0 {
                0.0
            } else {
                sum as f64 / total_reviews as f64
            },
            distribution,
            verified_purchases: reviews.iter().filter(|r| r.verified_purchase).count(),
        }
    }

    pub fn count_for(&self, stars: u8) -> usize {
        match stars {
            1..=5 => self.distribution[(stars - 1) as usize],
            _ => 0,
        }
    }
}
