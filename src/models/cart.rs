use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Largest quantity a single cart line may hold.
pub const MAX_QUANTITY: i64 = 999;

/// Catalogue entry. Owned by the seller side; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            price,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cart {
    pub id: Uuid,
    pub member_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(member_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            member_id,
            created_at: Utc::now(),
        }
    }
}

/// One line of a cart. Starts out pending (`order_id` unset) and is linked
/// to an order exactly once at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartProduct {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub order_id: Option<Uuid>,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartProduct {
    pub fn new(cart_id: Uuid, product_id: Uuid, quantity: i64) -> AppResult<Self> {
        validate_quantity(quantity)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            cart_id,
            product_id,
            order_id: None,
            quantity,
            created_at: now,
            updated_at: now,
        })
    }

    /// `price * quantity`, refused instead of wrapping.
    pub fn subtotal(&self, price: i64) -> AppResult<i64> {
        price
            .checked_mul(self.quantity)
            .ok_or_else(|| AppError::Validation("Cart total is too large".into()))
    }

    pub fn is_ordered(&self) -> bool {
        self.order_id.is_some()
    }

    pub fn update_quantity(&mut self, quantity: i64) -> AppResult<()> {
        if self.is_ordered() {
            return Err(AppError::Conflict(
                "An ordered item can no longer be changed".into(),
            ));
        }
        validate_quantity(quantity)?;
        self.quantity = quantity;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn connect_order(&mut self, order_id: Uuid) -> AppResult<()> {
        if let Some(existing) = self.order_id {
            return Err(AppError::Conflict(format!(
                "Cart item is already part of order {existing}"
            )));
        }
        self.order_id = Some(order_id);
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn validate_quantity(quantity: i64) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::Validation("Quantity must be at least 1".into()));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::Validation(format!(
            "Quantity must be at most {MAX_QUANTITY}"
        )));
    }
    Ok(())
}
