use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub total_price: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(buyer_id: Uuid, total_price: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            buyer_id,
            total_price,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord,
)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Preparing,
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Statuses summarised on the buyer's order page. `Pending` orders have
    /// not been paid for yet and are not counted.
    pub fn management_statuses() -> &'static [OrderStatus] {
        &[
            OrderStatus::Paid,
            OrderStatus::Preparing,
            OrderStatus::Shipping,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ]
    }
}

/// Count orders per management status. Every management status is present
/// in the result, with zero when no order has it.
pub fn count_by_status(orders: &[Order]) -> BTreeMap<OrderStatus, i64> {
    let mut counts: BTreeMap<OrderStatus, i64> = OrderStatus::management_statuses()
        .iter()
        .map(|status| (*status, 0))
        .collect();
    for order in orders {
        if let Some(count) = counts.get_mut(&order.status) {
            *count += 1;
        }
    }
    counts
}
