//! Orders handler - places orders and reports order status.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::{describe_errors, int_arg, SideEffect, ToolHandler, ToolOutcome};
use crate::domain::catalog::{
    resolve_product, BedSize, Order, OrderRequest, PaymentMethod, ESTIMATED_DELIVERY, MAX_ORDER_QUANTITY,
};
use crate::domain::foundation::{OrderId, ValidationError};
use crate::domain::routing::HandlerKind;
use crate::ports::{OrderStore, ProductCatalog, ToolCall, ToolDefinition};

const INVALID_ORDER: &str = "I couldn't place that order:";

pub struct OrdersHandler {
    products: Arc<dyn ProductCatalog>,
    orders: Arc<dyn OrderStore>,
}

impl OrdersHandler {
    pub fn new(products: Arc<dyn ProductCatalog>, orders: Arc<dyn OrderStore>) -> Self {
        Self { products, orders }
    }

    /// Validates everything before the single write.
    async fn create_order(&self, call: &ToolCall) -> ToolOutcome {
        let (quantity, quantity_error) = match int_arg(call, "quantity") {
            Ok(q) => (q, None),
            Err(err) => (None, Some(err)),
        };
        let request = OrderRequest {
            product_id: call.str_arg("product_id").map(str::to_string),
            size: call.str_arg("size").map(str::to_string),
            quantity,
            delivery_address: call.str_arg("delivery_address").map(str::to_string),
            payment_method: call.str_arg("payment_method").map(str::to_string),
        };
        let valid = match (request.validate(), quantity_error) {
            (Ok(valid), None) => valid,
            (Ok(_), Some(err)) => return ToolOutcome::Invalid(describe_errors(INVALID_ORDER, &[err])),
            (Err(mut errors), quantity_error) => {
                errors.extend(quantity_error);
                return ToolOutcome::Invalid(describe_errors(INVALID_ORDER, &errors));
            }
        };

        let catalog = match self.products.list_products().await {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::error!(error = %err, "Product catalog read failed");
                return ToolOutcome::DataAccess(
                    "I couldn't reach our product catalog, so no order was placed. Please try again shortly."
                        .to_string(),
                );
            }
        };
        let Some(product) = resolve_product(&valid.product_ref, &catalog) else {
            let names: Vec<&str> = catalog.iter().map(|p| p.name.as_str()).collect();
            let err = ValidationError::not_allowed("product_id", &names);
            return ToolOutcome::Invalid(describe_errors(INVALID_ORDER, &[err]));
        };
        let order = match Order::place(product, valid) {
            Ok(order) => order,
            Err(err) => return ToolOutcome::Invalid(describe_errors(INVALID_ORDER, &[err])),
        };

        if let Err(err) = self.orders.create_order(&order).await {
            tracing::error!(product_id = %order.product_id, error = %err, "Order write failed");
            return ToolOutcome::DataAccess(
                "I'm sorry, your order could not be saved and you have not been charged. Please try again later."
                    .to_string(),
            );
        }
        tracing::info!(order_id = %order.order_id, total = order.total, "Order placed");

        ToolOutcome::Done {
            data: json!({
                "success": true,
                "order": order,
                "estimated_delivery": ESTIMATED_DELIVERY,
            }),
            rendered: format!(
                "Your order {} is confirmed: {} x {} ({}), total ${:.2}, paid by {}. \
                 It will be delivered to {} in {}.",
                order.order_id,
                order.quantity,
                order.product_name,
                order.size,
                order.total,
                order.payment_method.as_str().replace('_', " "),
                order.delivery_address,
                ESTIMATED_DELIVERY
            ),
            effect: Some(SideEffect::OrderCreated(order.order_id.clone())),
        }
    }

    async fn order_status(&self, call: &ToolCall) -> ToolOutcome {
        let Some(raw) = call.str_arg("order_id") else {
            return ToolOutcome::Invalid("Please give me your order number, it starts with UC.".to_string());
        };
        let not_found = || {
            ToolOutcome::NotFound(format!(
                "I couldn't find an order with ID {}. Please check the order number and try again.",
                raw
            ))
        };
        let Ok(id) = OrderId::parse(raw) else {
            return not_found();
        };
        match self.orders.find_order(&id).await {
            Ok(Some(order)) => ToolOutcome::Done {
                rendered: format!(
                    "Order {} for {} x {} ({}) is {}. Total ${:.2}.",
                    order.order_id,
                    order.quantity,
                    order.product_name,
                    order.size,
                    order.status.as_str(),
                    order.total
                ),
                data: json!({ "order": order }),
                effect: None,
            },
            Ok(None) => not_found(),
            Err(err) => {
                tracing::error!(order_id = %id, error = %err, "Order read failed");
                ToolOutcome::DataAccess(
                    "I couldn't look up your order just now. Please try again in a moment.".to_string(),
                )
            }
        }
    }
}

#[async_trait]
impl ToolHandler for OrdersHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Orders
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
            "You are the orders specialist for a mattress store's customer support. \
             You place new orders and look up existing ones. An order needs the product, \
             a size ({sizes}), a quantity (1 to {max}, default 1), a delivery address and \
             a payment method ({payments}). Ask for anything missing and confirm the \
             details before calling create_order. Delivery takes {delivery}.\n\n\
             Products:\n{summary}",
            sizes = BedSize::ALL.join(", "),
            max = MAX_ORDER_QUANTITY,
            payments = PaymentMethod::ALL.join(", "),
            delivery = ESTIMATED_DELIVERY,
            summary = summary
        )
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "create_order",
                "Place a new mattress order",
                json!({
                    "type": "object",
                    "properties": {
                        "product_id": { "type": "string", "description": "Product id or name" },
                        "size": { "type": "string", "enum": BedSize::ALL },
                        "quantity": { "type": "integer", "minimum": 1, "maximum": MAX_ORDER_QUANTITY },
                        "delivery_address": { "type": "string" },
                        "payment_method": { "type": "string", "enum": PaymentMethod::ALL }
                    },
                    "required": ["product_id", "size", "delivery_address", "payment_method"]
                }),
            ),
            ToolDefinition::new(
                "get_order_status",
                "Look up an existing order",
                json!({
                    "type": "object",
                    "properties": {
                        "order_id": { "type": "string", "description": "Order number, e.g. UC1A2B3C4D" }
                    },
                    "required": ["order_id"]
                }),
            ),
        ]
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        match call.name.as_str() {
            "create_order" => self.create_order(call).await,
            "get_order_status" => self.order_status(call).await,
            other => ToolOutcome::Invalid(format!("Unsupported request '{}'.", other)),
        }
    }
}
