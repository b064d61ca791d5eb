use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{RecordStatus, SoftDelete};

/// A supplement a buyer has registered for daily tracking.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Diary {
    pub id: Uuid,
    pub member_id: Uuid,
    pub name: String,
    pub memo: Option<String>,
    pub intake_time: Option<NaiveTime>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Diary {
    pub fn new(
        member_id: Uuid,
        name: String,
        memo: Option<String>,
        intake_time: Option<NaiveTime>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            member_id,
            name,
            memo,
            intake_time,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_owned_by(&self, member_id: Uuid) -> bool {
        self.member_id == member_id
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.status = RecordStatus::Deleted;
        self.deleted_at = Some(at);
        self.updated_at = at;
    }
}

impl SoftDelete for Diary {
    fn status(&self) -> RecordStatus {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_delete_sets_tombstone_and_timestamp() {
        let owner = Uuid::new_v4();
        let mut diary = Diary::new(owner, "Vitamin C".into(), None, None);
        assert!(diary.is_active());
        assert!(diary.is_owned_by(owner));
        assert!(!diary.is_owned_by(Uuid::new_v4()));

        let at = Utc::now();
        diary.soft_delete(at);
        assert!(!diary.is_active());
        assert_eq!(diary.deleted_at, Some(at));
    }
}
