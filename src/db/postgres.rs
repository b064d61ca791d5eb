use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CartRepository, DiaryCheckLogRepository, DiaryRepository, OrderRepository, Store};
use crate::error::{AppError, AppResult};
use crate::models::cart::{Cart, CartProduct, Product};
use crate::models::check_log::{DiaryCheckLog, ToggleOutcome};
use crate::models::diary::Diary;
use crate::models::order::Order;

/// Soft-delete filter shared by every read of a tombstoned table.
const ACTIVE: &str = "status = 'active'";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DiaryRepository for PgStore {
    async fn insert_diary(&self, diary: &Diary) -> AppResult<Diary> {
        let diary = sqlx::query_as::<_, Diary>(
            r#"
            INSERT INTO diaries (id, member_id, name, memo, intake_time, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(diary.id)
        .bind(diary.member_id)
        .bind(&diary.name)
        .bind(&diary.memo)
        .bind(diary.intake_time)
        .bind(diary.status)
        .bind(diary.created_at)
        .bind(diary.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(diary)
    }

    async fn find_diary(&self, id: Uuid) -> AppResult<Option<Diary>> {
        let sql = format!("SELECT * FROM diaries WHERE id = $1 AND {ACTIVE}");
        let diary = sqlx::query_as::<_, Diary>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(diary)
    }

    async fn find_diaries_by_member(&self, member_id: Uuid) -> AppResult<Vec<Diary>> {
        let sql = format!(
            "SELECT * FROM diaries WHERE member_id = $1 AND {ACTIVE} ORDER BY created_at ASC, id ASC"
        );
        let diaries = sqlx::query_as::<_, Diary>(&sql)
            .bind(member_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(diaries)
    }

    async fn soft_delete_diary(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Option<Diary>> {
        let sql = format!(
            r#"
            UPDATE diaries SET
                status = 'deleted',
                deleted_at = $2,
                updated_at = $2
            WHERE id = $1 AND {ACTIVE}
            RETURNING *
            "#
        );
        let diary = sqlx::query_as::<_, Diary>(&sql)
            .bind(id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        Ok(diary)
    }
}

#[async_trait]
impl DiaryCheckLogRepository for PgStore {
    async fn find_check_logs_by_member(&self, member_id: Uuid) -> AppResult<Vec<DiaryCheckLog>> {
        let sql = format!(
            "SELECT * FROM diary_check_logs WHERE member_id = $1 AND {ACTIVE} ORDER BY created_at ASC"
        );
        let logs = sqlx::query_as::<_, DiaryCheckLog>(&sql)
            .bind(member_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(logs)
    }

    async fn find_check_logs_by_date(
        &self,
        member_id: Uuid,
        check_date: NaiveDate,
    ) -> AppResult<Vec<DiaryCheckLog>> {
        let sql = format!(
            r#"
            SELECT * FROM diary_check_logs
            WHERE member_id = $1 AND check_date = $2 AND {ACTIVE}
            ORDER BY created_at ASC
            "#
        );
        let logs = sqlx::query_as::<_, DiaryCheckLog>(&sql)
            .bind(member_id)
            .bind(check_date)
            .fetch_all(&self.pool)
            .await?;

        Ok(logs)
    }

    async fn find_check_log(&self, id: Uuid) -> AppResult<Option<DiaryCheckLog>> {
        let sql = format!("SELECT * FROM diary_check_logs WHERE id = $1 AND {ACTIVE}");
        let log = sqlx::query_as::<_, DiaryCheckLog>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(log)
    }

    async fn toggle_check(
        &self,
        diary: &Diary,
        check_date: NaiveDate,
    ) -> AppResult<ToggleOutcome> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the diary serializes concurrent toggles of the same item.
        let locked = sqlx::query_scalar::<_, Uuid>(&format!(
            "SELECT id FROM diaries WHERE id = $1 AND {ACTIVE} FOR UPDATE"
        ))
        .bind(diary.id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Err(AppError::NotFound("Diary not found".into()));
        }

        let existing = sqlx::query_as::<_, DiaryCheckLog>(&format!(
            "SELECT * FROM diary_check_logs WHERE diary_id = $1 AND check_date = $2 AND {ACTIVE}"
        ))
        .bind(diary.id)
        .bind(check_date)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match existing {
            Some(log) => {
                let log = sqlx::query_as::<_, DiaryCheckLog>(
                    r#"
                    UPDATE diary_check_logs SET status = 'deleted', deleted_at = NOW()
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(log.id)
                .fetch_one(&mut *tx)
                .await?;
                ToggleOutcome::Unchecked(log)
            }
            None => {
                let draft = DiaryCheckLog::new(diary, check_date);
                let log = sqlx::query_as::<_, DiaryCheckLog>(
                    r#"
                    INSERT INTO diary_check_logs (id, diary_id, member_id, check_date, status, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING *
                    "#,
                )
                .bind(draft.id)
                .bind(draft.diary_id)
                .bind(draft.member_id)
                .bind(draft.check_date)
                .bind(draft.status)
                .bind(draft.created_at)
                .fetch_one(&mut *tx)
                .await?;
                ToggleOutcome::Checked(log)
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    async fn find_or_create_cart(&self, member_id: Uuid) -> AppResult<Cart> {
        let draft = Cart::new(member_id);
        // No-op update on conflict so RETURNING yields the existing cart
        let cart = sqlx::query_as::<_, Cart>(
            r#"
            INSERT INTO carts (id, member_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (member_id) DO UPDATE
                SET member_id = carts.member_id
            RETURNING *
            "#,
        )
        .bind(draft.id)
        .bind(draft.member_id)
        .bind(draft.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(cart)
    }

    async fn find_cart_product(&self, id: Uuid) -> AppResult<Option<CartProduct>> {
        let line = sqlx::query_as::<_, CartProduct>("SELECT * FROM cart_products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(line)
    }

    async fn find_pending_cart_products(&self, cart_id: Uuid) -> AppResult<Vec<CartProduct>> {
        let lines = sqlx::query_as::<_, CartProduct>(
            r#"
            SELECT * FROM cart_products
            WHERE cart_id = $1 AND order_id IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn save_cart_product(&self, line: &CartProduct) -> AppResult<CartProduct> {
        let line = sqlx::query_as::<_, CartProduct>(
            r#"
            INSERT INTO cart_products (id, cart_id, product_id, order_id, quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                quantity = EXCLUDED.quantity,
                updated_at = EXCLUDED.updated_at
            WHERE cart_products.order_id IS NULL
            RETURNING *
            "#,
        )
        .bind(line.id)
        .bind(line.cart_id)
        .bind(line.product_id)
        .bind(line.order_id)
        .bind(line.quantity)
        .bind(line.created_at)
        .bind(line.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict("An ordered item can no longer be changed".into()))?;

        Ok(line)
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn place_order(&self, order: &Order, lines: &[CartProduct]) -> AppResult<Order> {
        let mut tx = self.pool.begin().await?;

        let placed = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (id, buyer_id, total_price, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(order.id)
        .bind(order.buyer_id)
        .bind(order.total_price)
        .bind(order.status)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        for line in lines {
            let result = sqlx::query(
                r#"
                UPDATE cart_products SET order_id = $1, updated_at = NOW()
                WHERE id = $2 AND order_id IS NULL
                "#,
            )
            .bind(placed.id)
            .bind(line.id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls the order back
                return Err(AppError::Conflict(
                    "Cart changed while ordering, please try again".into(),
                ));
            }
        }

        tx.commit().await?;
        Ok(placed)
    }

    async fn find_orders_by_buyer(&self, buyer_id: Uuid) -> AppResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE buyer_id = $1 ORDER BY created_at DESC",
        )
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
