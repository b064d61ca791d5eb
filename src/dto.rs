//! # MyPill: Request/Response DTOs
//!
//! Form bodies posted by the buyer pages and the view models the GET pages
//! render from.
//!
//! Conventions:
//! - `*Request`  → deserialized from an `application/x-www-form-urlencoded` body
//! - `*Response` → serialized as the page's `response` (see `flash::Page`)
//! - Optional form fields arrive as empty strings and are normalised by the
//!   services, not here

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::check_log::DiaryCheckLog;
use crate::models::diary::Diary;
use crate::models::order::{count_by_status, Order, OrderStatus};
use crate::services::diary::DiaryStatus;

// ============================================================================
// Diary
// ============================================================================

pub const DIARY_NAME_MAX: usize = 100;
pub const DIARY_MEMO_MAX: usize = 500;

/// POST /diary/create
#[derive(Debug, Deserialize, Validate)]
pub struct DiaryRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = "DIARY_NAME_MAX",
        message = "Supplement name must be 1-100 characters"
    ))]
    pub name: String,

    #[validate(length(max = "DIARY_MEMO_MAX", message = "Memo must be at most 500 characters"))]
    pub memo: Option<String>,

    /// Time of day the supplement is taken, "HH:MM"
    pub intake_time: Option<String>,
}

/// GET /diary/create
#[derive(Debug, Serialize)]
pub struct CreateFormResponse {
    pub name_max_length: usize,
    pub memo_max_length: usize,
    pub intake_time_format: &'static str,
}

impl Default for CreateFormResponse {
    fn default() -> Self {
        Self {
            name_max_length: DIARY_NAME_MAX,
            memo_max_length: DIARY_MEMO_MAX,
            intake_time_format: "HH:MM",
        }
    }
}

/// GET /diary/list
#[derive(Debug, Serialize)]
pub struct DiaryListResponse {
    pub diaries: Vec<Diary>,
    pub count: usize,
}

impl DiaryListResponse {
    pub fn new(diaries: Vec<Diary>) -> Self {
        Self {
            count: diaries.len(),
            diaries,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DiaryTodayResponse {
    #[serde(flatten)]
    pub diary: Diary,
    pub checked_today: bool,
}

/// All checks made on one calendar day, earliest first.
#[derive(Debug, Serialize, PartialEq)]
pub struct CheckDay {
    pub date: NaiveDate,
    pub logs: Vec<DiaryCheckLog>,
}

/// GET /diary/todolist
#[derive(Debug, Serialize)]
pub struct TodoListResponse {
    pub today: NaiveDate,
    pub diaries: Vec<DiaryTodayResponse>,
    pub history: Vec<CheckDay>,
}

impl TodoListResponse {
    pub fn new(today: NaiveDate, statuses: Vec<DiaryStatus>, history: Vec<DiaryCheckLog>) -> Self {
        Self {
            today,
            diaries: statuses
                .into_iter()
                .map(|s| DiaryTodayResponse {
                    diary: s.diary,
                    checked_today: s.checked,
                })
                .collect(),
            history: group_by_check_date(history),
        }
    }
}

/// Group a flat check history into calendar days.
///
/// Entries are ordered by creation time before grouping, so each day lists
/// its checks in the order they were made. Days come out in date order.
pub fn group_by_check_date(mut history: Vec<DiaryCheckLog>) -> Vec<CheckDay> {
    history.sort_by_key(|log| log.created_at);

    let mut days: BTreeMap<NaiveDate, Vec<DiaryCheckLog>> = BTreeMap::new();
    for log in history {
        days.entry(log.check_date).or_default().push(log);
    }

    days.into_iter()
        .map(|(date, logs)| CheckDay { date, logs })
        .collect()
}

// ============================================================================
// Cart
// ============================================================================

/// POST /cart/add
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// POST /cart/update/{cart_product_id}
#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct CartLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub price: i64,
    pub quantity: i64,
    pub subtotal: i64,
}

/// GET /cart
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub lines: Vec<CartLineResponse>,
    pub total: i64,
}

// ============================================================================
// Orders
// ============================================================================

/// GET /buyer/myOrder
#[derive(Debug, Serialize)]
pub struct MyOrderResponse {
    pub orders: Vec<Order>,
    pub order_status_count: BTreeMap<OrderStatus, i64>,
    /// Statuses the page offers as filters, in display order
    pub filtered_order_status: Vec<OrderStatus>,
}

impl MyOrderResponse {
    pub fn new(orders: Vec<Order>) -> Self {
        Self {
            order_status_count: count_by_status(&orders),
            orders,
            filtered_order_status: OrderStatus::management_statuses().to_vec(),
        }
    }
}
