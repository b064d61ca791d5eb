pub mod cart;
pub mod check_log;
pub mod diary;
pub mod member;
pub mod order;

use serde::{Deserialize, Serialize};

/// Tombstone carried by every soft-deletable row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "record_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Deleted,
}

impl Default for RecordStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Rows that are logically removed by flipping their status instead of
/// being dropped from storage. Read paths in `db` filter on this.
pub trait SoftDelete {
    fn status(&self) -> RecordStatus;

    fn is_active(&self) -> bool {
        self.status() == RecordStatus::Active
    }
}
