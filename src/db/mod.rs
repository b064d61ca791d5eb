//! Storage access.
//!
//! One repository trait per aggregate, bundled into [`Store`] so handlers
//! hold a single `Arc<dyn Store>`. Both backends apply the soft-delete
//! filter themselves: callers never see a tombstoned diary or check log.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::cart::{Cart, CartProduct, Product};
use crate::models::check_log::{DiaryCheckLog, ToggleOutcome};
use crate::models::diary::Diary;
use crate::models::order::Order;

#[async_trait]
pub trait DiaryRepository: Send + Sync {
    async fn insert_diary(&self, diary: &Diary) -> AppResult<Diary>;

    async fn find_diary(&self, id: Uuid) -> AppResult<Option<Diary>>;

    /// Active diaries of a member in insertion order.
    async fn find_diaries_by_member(&self, member_id: Uuid) -> AppResult<Vec<Diary>>;

    /// Tombstone an active diary. `None` when there was nothing to delete.
    async fn soft_delete_diary(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Option<Diary>>;
}

#[async_trait]
pub trait DiaryCheckLogRepository: Send + Sync {
    async fn find_check_logs_by_member(&self, member_id: Uuid) -> AppResult<Vec<DiaryCheckLog>>;

    async fn find_check_logs_by_date(
        &self,
        member_id: Uuid,
        check_date: NaiveDate,
    ) -> AppResult<Vec<DiaryCheckLog>>;

    async fn find_check_log(&self, id: Uuid) -> AppResult<Option<DiaryCheckLog>>;

    /// Flip the check state of `(diary, check_date)` as one atomic step:
    /// tombstone the active log if there is one, otherwise create it.
    async fn toggle_check(&self, diary: &Diary, check_date: NaiveDate)
        -> AppResult<ToggleOutcome>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>>;

    async fn find_or_create_cart(&self, member_id: Uuid) -> AppResult<Cart>;

    async fn find_cart_product(&self, id: Uuid) -> AppResult<Option<CartProduct>>;

    /// Lines of a cart that have not been ordered yet, oldest first.
    async fn find_pending_cart_products(&self, cart_id: Uuid) -> AppResult<Vec<CartProduct>>;

    async fn save_cart_product(&self, line: &CartProduct) -> AppResult<CartProduct>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert `order` and link every line to it. Fails with `Conflict`, and
    /// writes nothing, if any line was already linked to an order.
    async fn place_order(&self, order: &Order, lines: &[CartProduct]) -> AppResult<Order>;

    /// Orders of a buyer, newest first.
    async fn find_orders_by_buyer(&self, buyer_id: Uuid) -> AppResult<Vec<Order>>;
}

#[async_trait]
pub trait Store:
    DiaryRepository + DiaryCheckLogRepository + CartRepository + OrderRepository
{
    fn backend_tag(&self) -> &'static str;

    async fn ping(&self) -> AppResult<()>;
}
