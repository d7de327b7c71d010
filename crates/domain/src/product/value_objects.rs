//! Value objects for the allocation domain.

use common::{OrderId, Sku};
use serde::{Deserialize, Serialize};

/// A single line of a customer order.
///
/// Order lines are immutable value objects: equality and hashing cover all
/// three fields, so re-allocating an identical line is a set-level no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// The order this line belongs to.
    pub order_id: OrderId,

    /// The product being ordered.
    pub sku: Sku,

    /// Quantity ordered, always greater than zero.
    pub qty: u32,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(order_id: impl Into<OrderId>, sku: impl Into<Sku>, qty: u32) -> Self {
        Self {
            order_id: order_id.into(),
            sku: sku.into(),
            qty,
        }
    }
}
