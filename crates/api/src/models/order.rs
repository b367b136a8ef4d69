//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use order_desk_core::{OrderId, OrderItemId, OrderStatus, Price, PriceError, Quantity, UserId};

/// An order (domain type).
///
/// `total_price` always equals [`order_total`] over the order's current items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub owner_user_id: UserId,
    pub status: OrderStatus,
    pub total_price: Price,
    pub created_at: DateTime<Utc>,
}

/// A line item of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub quantity: Quantity,
    pub flavor: String,
    pub size: String,
    pub unit_price: Price,
}

/// Data for adding a line item.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub quantity: Quantity,
    pub flavor: String,
    pub size: String,
    pub unit_price: Price,
}

/// Sum of `unit_price * quantity` over `items`.
///
/// # Errors
///
/// Returns `PriceError::Overflow` if a line or the running sum does not fit.
pub fn order_total(items: &[OrderItem]) -> Result<Price, PriceError> {
    items.iter().try_fold(Price::ZERO, |total, item| {
        total.checked_add(item.unit_price.line_total(item.quantity)?)
    })
}
