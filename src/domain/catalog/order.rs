//! Orders: request validation and the confirmed order record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Product;
use crate::domain::foundation::{OrderId, ProductId, Timestamp, ValidationError};

pub const MAX_ORDER_QUANTITY: i64 = 10;
pub const ESTIMATED_DELIVERY: &str = "5-7 business days";

/// Mattress sizes that can be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BedSize {
    Twin,
    #[serde(rename = "Twin XL")]
    TwinXl,
    Full,
    Queen,
    King,
    #[serde(rename = "California King")]
    CaliforniaKing,
}

impl BedSize {
    pub const ALL: [&'static str; 6] = ["Twin", "Twin XL", "Full", "Queen", "King", "California King"];

    pub fn label(&self) -> &'static str {
        match self {
            BedSize::Twin => "Twin",
            BedSize::TwinXl => "Twin XL",
            BedSize::Full => "Full",
            BedSize::Queen => "Queen",
            BedSize::King => "King",
            BedSize::CaliforniaKing => "California King",
        }
    }
}

impl FromStr for BedSize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase().replace(['-', '_'], " ");
        match normalised.as_str() {
            "twin" => Ok(BedSize::Twin),
            "twin xl" => Ok(BedSize::TwinXl),
            "full" | "double" => Ok(BedSize::Full),
            "queen" => Ok(BedSize::Queen),
            "king" => Ok(BedSize::King),
            "california king" | "cal king" => Ok(BedSize::CaliforniaKing),
            _ => Err(ValidationError::not_allowed("size", &Self::ALL)),
        }
    }
}

impl fmt::Display for BedSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
}

impl PaymentMethod {
    pub const ALL: [&'static str; 3] = ["credit_card", "debit_card", "paypal"];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Paypal => "paypal",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalised.as_str() {
            "credit_card" | "credit" => Ok(PaymentMethod::CreditCard),
            "debit_card" | "debit" => Ok(PaymentMethod::DebitCard),
            "paypal" | "pay_pal" => Ok(PaymentMethod::Paypal),
            _ => Err(ValidationError::not_allowed("payment_method", &Self::ALL)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// Order fields as extracted from the conversation; anything may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// An order request with every field present and well-formed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidOrderRequest {
    pub product_ref: String,
    pub size: BedSize,
    pub quantity: u32,
    pub delivery_address: String,
    pub payment_method: PaymentMethod,
}

impl OrderRequest {
    /// Checks presence and format of every field, reporting all problems at once.
    ///
    /// Quantity defaults to 1 when omitted.
    pub fn validate(&self) -> Result<ValidOrderRequest, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let product_ref = required(&self.product_id, "product_id", &mut errors);
        let size = required(&self.size, "size", &mut errors)
            .and_then(|s| s.parse::<BedSize>().map_err(|e| errors.push(e)).ok());
        let quantity = match self.quantity.unwrap_or(1) {
            q if (1..=MAX_ORDER_QUANTITY).contains(&q) => Some(q as u32),
            q => {
                errors.push(ValidationError::out_of_range("quantity", 1, MAX_ORDER_QUANTITY, q));
                None
            }
        };
        let delivery_address = required(&self.delivery_address, "delivery_address", &mut errors);
        let payment_method = required(&self.payment_method, "payment_method", &mut errors)
            .and_then(|s| s.parse::<PaymentMethod>().map_err(|e| errors.push(e)).ok());

        match (product_ref, size, quantity, delivery_address, payment_method) {
            (Some(product_ref), Some(size), Some(quantity), Some(delivery_address), Some(payment_method))
                if errors.is_empty() =>
            {
                Ok(ValidOrderRequest {
                    product_ref,
                    size,
                    quantity,
                    delivery_address,
                    payment_method,
                })
            }
            _ => Err(errors),
        }
    }
}

fn required(value: &Option<String>, field: &str, errors: &mut Vec<ValidationError>) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.push(ValidationError::empty_field(field));
            None
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub size: BedSize,
    pub quantity: u32,
    pub unit_price: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub payment_method: PaymentMethod,
    pub created_at: Timestamp,
}

impl Order {
    /// Prices a validated request against its product.
    ///
    /// # Errors
    ///
    /// - `NotAllowed` if the product is not made in the requested size
    pub fn place(product: &Product, request: ValidOrderRequest) -> Result<Self, ValidationError> {
        if !product.offers_size(request.size.label()) {
            let offered: Vec<&str> = product.available_sizes.iter().map(String::as_str).collect();
            return Err(ValidationError::not_allowed("size", &offered));
        }
        Ok(Self {
            order_id: OrderId::generate(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            size: request.size,
            quantity: request.quantity,
            unit_price: product.price,
            total: product.price * request.quantity as f64,
            status: OrderStatus::Confirmed,
            delivery_address: request.delivery_address,
            payment_method: request.payment_method,
            created_at: Timestamp::now(),
        })
    }
}
