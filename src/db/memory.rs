use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CartRepository, DiaryCheckLogRepository, DiaryRepository, OrderRepository, Store};
use crate::error::{AppError, AppResult};
use crate::models::cart::{Cart, CartProduct, Product};
use crate::models::check_log::{DiaryCheckLog, ToggleOutcome};
use crate::models::diary::Diary;
use crate::models::order::Order;
use crate::models::SoftDelete;

/// Process-local store. Every operation takes the single table lock, so
/// compound operations such as `toggle_check` are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    diaries: Vec<Diary>,
    check_logs: Vec<DiaryCheckLog>,
    products: HashMap<Uuid, Product>,
    carts: Vec<Cart>,
    cart_products: Vec<CartProduct>,
    orders: Vec<Order>,
}

fn active<T: SoftDelete>(rows: &[T]) -> impl Iterator<Item = &T> {
    rows.iter().filter(|row| row.is_active())
}

fn active_mut<T: SoftDelete>(rows: &mut [T]) -> impl Iterator<Item = &mut T> {
    rows.iter_mut().filter(|row| row.is_active())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Products are managed by the seller side; this stands in for it.
    pub async fn seed_product(&self, product: Product) -> Product {
        let mut tables = self.tables.lock().await;
        tables.products.insert(product.id, product.clone());
        product
    }

    /// Every check log ever written, tombstoned ones included.
    pub async fn raw_check_logs(&self) -> Vec<DiaryCheckLog> {
        self.tables.lock().await.check_logs.clone()
    }
}

#[async_trait]
impl DiaryRepository for MemoryStore {
    async fn insert_diary(&self, diary: &Diary) -> AppResult<Diary> {
        let mut tables = self.tables.lock().await;
        tables.diaries.push(diary.clone());
        Ok(diary.clone())
    }

    async fn find_diary(&self, id: Uuid) -> AppResult<Option<Diary>> {
        let tables = self.tables.lock().await;
        let diary = active(&tables.diaries).find(|d| d.id == id).cloned();
        Ok(diary)
    }

    async fn find_diaries_by_member(&self, member_id: Uuid) -> AppResult<Vec<Diary>> {
        let tables = self.tables.lock().await;
        let diaries = active(&tables.diaries)
            .filter(|d| d.member_id == member_id)
            .cloned()
            .collect();
        Ok(diaries)
    }

    async fn soft_delete_diary(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Option<Diary>> {
        let mut tables = self.tables.lock().await;
        let deleted = active_mut(&mut tables.diaries)
            .find(|d| d.id == id)
            .map(|diary| {
                diary.soft_delete(at);
                diary.clone()
            });
        Ok(deleted)
    }
}

#[async_trait]
impl DiaryCheckLogRepository for MemoryStore {
    async fn find_check_logs_by_member(&self, member_id: Uuid) -> AppResult<Vec<DiaryCheckLog>> {
        let tables = self.tables.lock().await;
        let mut logs: Vec<DiaryCheckLog> = active(&tables.check_logs)
            .filter(|l| l.member_id == member_id)
            .cloned()
            .collect();
        logs.sort_by_key(|l| l.created_at);
        Ok(logs)
    }

    async fn find_check_logs_by_date(
        &self,
        member_id: Uuid,
        check_date: NaiveDate,
    ) -> AppResult<Vec<DiaryCheckLog>> {
        let tables = self.tables.lock().await;
        let mut logs: Vec<DiaryCheckLog> = active(&tables.check_logs)
            .filter(|l| l.member_id == member_id && l.check_date == check_date)
            .cloned()
            .collect();
        logs.sort_by_key(|l| l.created_at);
        Ok(logs)
    }

    async fn find_check_log(&self, id: Uuid) -> AppResult<Option<DiaryCheckLog>> {
        let tables = self.tables.lock().await;
        let log = active(&tables.check_logs).find(|l| l.id == id).cloned();
        Ok(log)
    }

    async fn toggle_check(
        &self,
        diary: &Diary,
        check_date: NaiveDate,
    ) -> AppResult<ToggleOutcome> {
        let mut tables = self.tables.lock().await;

        if active(&tables.diaries).all(|d| d.id != diary.id) {
            return Err(AppError::NotFound("Diary not found".into()));
        }

        let existing = active_mut(&mut tables.check_logs)
            .find(|l| l.diary_id == diary.id && l.check_date == check_date);

        let outcome = match existing {
            Some(log) => {
                log.soft_delete(Utc::now());
                ToggleOutcome::Unchecked(log.clone())
            }
            None => {
                let log = DiaryCheckLog::new(diary, check_date);
                tables.check_logs.push(log.clone());
                ToggleOutcome::Checked(log)
            }
        };

        Ok(outcome)
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let tables = self.tables.lock().await;
        Ok(tables.products.get(&id).cloned())
    }

    async fn find_or_create_cart(&self, member_id: Uuid) -> AppResult<Cart> {
        let mut tables = self.tables.lock().await;
        if let Some(cart) = tables.carts.iter().find(|c| c.member_id == member_id) {
            return Ok(cart.clone());
        }
        let cart = Cart::new(member_id);
        tables.carts.push(cart.clone());
        Ok(cart)
    }

    async fn find_cart_product(&self, id: Uuid) -> AppResult<Option<CartProduct>> {
        let tables = self.tables.lock().await;
        Ok(tables.cart_products.iter().find(|l| l.id == id).cloned())
    }

    async fn find_pending_cart_products(&self, cart_id: Uuid) -> AppResult<Vec<CartProduct>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .cart_products
            .iter()
            .filter(|l| l.cart_id == cart_id && !l.is_ordered())
            .cloned()
            .collect())
    }

    async fn save_cart_product(&self, line: &CartProduct) -> AppResult<CartProduct> {
        let mut tables = self.tables.lock().await;
        match tables.cart_products.iter_mut().find(|l| l.id == line.id) {
            Some(stored) if stored.is_ordered() => Err(AppError::Conflict(
                "An ordered item can no longer be changed".into(),
            )),
            Some(stored) => {
                stored.quantity = line.quantity;
                stored.updated_at = line.updated_at;
                Ok(stored.clone())
            }
            None => {
                tables.cart_products.push(line.clone());
                Ok(line.clone())
            }
        }
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn place_order(&self, order: &Order, lines: &[CartProduct]) -> AppResult<Order> {
        let mut tables = self.tables.lock().await;

        let still_pending = lines.iter().all(|line| {
            tables
                .cart_products
                .iter()
                .any(|stored| stored.id == line.id && !stored.is_ordered())
        });
        if !still_pending {
            return Err(AppError::Conflict(
                "Cart changed while ordering, please try again".into(),
            ));
        }

        let now = Utc::now();
        for stored in tables
            .cart_products
            .iter_mut()
            .filter(|stored| lines.iter().any(|line| line.id == stored.id))
        {
            stored.order_id = Some(order.id);
            stored.updated_at = now;
        }
        tables.orders.push(order.clone());
        Ok(order.clone())
    }

    async fn find_orders_by_buyer(&self, buyer_id: Uuid) -> AppResult<Vec<Order>> {
        let tables = self.tables.lock().await;
        let mut orders: Vec<Order> = tables
            .orders
            .iter()
            .filter(|o| o.buyer_id == buyer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
