use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::diary::Diary;
use super::{RecordStatus, SoftDelete};

/// "Member took this supplement on this date."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DiaryCheckLog {
    pub id: Uuid,
    pub diary_id: Uuid,
    pub member_id: Uuid,
    pub check_date: NaiveDate,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DiaryCheckLog {
    pub fn new(diary: &Diary, check_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            diary_id: diary.id,
            member_id: diary.member_id,
            check_date,
            status: RecordStatus::Active,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.status = RecordStatus::Deleted;
        self.deleted_at = Some(at);
    }
}

impl SoftDelete for DiaryCheckLog {
    fn status(&self) -> RecordStatus {
        self.status
    }
}

/// Result of flipping the check state of one (diary, date) pair.
#[derive(Debug, Clone)]
pub enum ToggleOutcome {
    /// No active log existed; this one was created.
    Checked(DiaryCheckLog),
    /// The active log was tombstoned.
    Unchecked(DiaryCheckLog),
}

impl ToggleOutcome {
    pub fn is_checked(&self) -> bool {
        matches!(self, ToggleOutcome::Checked(_))
    }

    pub fn log(&self) -> &DiaryCheckLog {
        match self {
            ToggleOutcome::Checked(log) | ToggleOutcome::Unchecked(log) => log,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            ToggleOutcome::Checked(_) => "checked",
            ToggleOutcome::Unchecked(_) => "unchecked",
        }
    }
}
