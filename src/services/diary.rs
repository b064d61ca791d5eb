use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;
use validator::Validate;

use super::{validation_error, Outcome};
use crate::db::Store;
use crate::dto::DiaryRequest;
use crate::error::{AppError, AppResult};
use crate::models::check_log::{DiaryCheckLog, ToggleOutcome};
use crate::models::diary::Diary;

/// A diary after a check toggle, with what the toggle did.
#[derive(Debug)]
pub struct Toggled {
    pub diary: Diary,
    pub outcome: ToggleOutcome,
}

/// A diary with whether it has been checked on a given day.
#[derive(Debug, Clone)]
pub struct DiaryStatus {
    pub diary: Diary,
    pub checked: bool,
}

pub struct DiaryService;

impl DiaryService {
    pub async fn create(
        store: &dyn Store,
        request: &DiaryRequest,
        owner_id: Uuid,
    ) -> AppResult<Outcome<Diary>> {
        request.validate().map_err(validation_error)?;

        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Supplement name is required".into()));
        }
        let memo = request
            .memo
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        let intake_time = parse_intake_time(request.intake_time.as_deref())?;

        let diary = store
            .insert_diary(&Diary::new(owner_id, name.to_string(), memo, intake_time))
            .await?;

        tracing::info!(member_id = %owner_id, diary_id = %diary.id, "Diary registered");
        Ok(Outcome::new(
            format!("{} has been registered.", diary.name),
            diary,
        ))
    }

    pub async fn get_list(store: &dyn Store, owner_id: Uuid) -> AppResult<Vec<Diary>> {
        store.find_diaries_by_member(owner_id).await
    }

    pub async fn delete(
        store: &dyn Store,
        diary_id: Uuid,
        owner_id: Uuid,
    ) -> AppResult<Outcome<Diary>> {
        let diary = Self::owned_diary(store, diary_id, owner_id, "delete").await?;

        let deleted = store
            .soft_delete_diary(diary.id, Utc::now())
            .await?
            .ok_or_else(|| AppError::NotFound("Diary not found".into()))?;

        tracing::info!(member_id = %owner_id, diary_id = %deleted.id, "Diary deleted");
        Ok(Outcome::new(
            format!("{} has been deleted.", deleted.name),
            deleted,
        ))
    }

    /// Flip the check of `diary_id` on `date`. Not idempotent: every call
    /// alternates between checked and unchecked.
    pub async fn toggle_check(
        store: &dyn Store,
        member_id: Uuid,
        diary_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Outcome<Toggled>> {
        let diary = Self::owned_diary(store, diary_id, member_id, "check").await?;

        let outcome = store.toggle_check(&diary, date).await?;

        tracing::info!(
            member_id = %member_id,
            diary_id = %diary.id,
            check_date = %date,
            action = outcome.action(),
            "Diary check toggled"
        );

        let message = if outcome.is_checked() {
            format!("Checked {} for {}.", diary.name, date)
        } else {
            format!("Unchecked {} for {}.", diary.name, date)
        };
        Ok(Outcome::new(message, Toggled { diary, outcome }))
    }

    /// Every active check of the member, across all of their diaries.
    pub async fn find_history(store: &dyn Store, member_id: Uuid) -> AppResult<Vec<DiaryCheckLog>> {
        store.find_check_logs_by_member(member_id).await
    }

    /// The member's diaries annotated with whether each was checked on `date`.
    pub async fn status_on(
        store: &dyn Store,
        member_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Vec<DiaryStatus>> {
        let diaries = store.find_diaries_by_member(member_id).await?;
        let checks = store.find_check_logs_by_date(member_id, date).await?;

        Ok(diaries
            .into_iter()
            .map(|diary| {
                let checked = checks.iter().any(|c| c.diary_id == diary.id);
                DiaryStatus { diary, checked }
            })
            .collect())
    }

    pub async fn get_check_log(
        store: &dyn Store,
        member_id: Uuid,
        log_id: Uuid,
    ) -> AppResult<DiaryCheckLog> {
        let log = store
            .find_check_log(log_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Check record not found".into()))?;

        if log.member_id != member_id {
            return Err(AppError::Forbidden(
                "You can only view your own check records".into(),
            ));
        }
        Ok(log)
    }

    async fn owned_diary(
        store: &dyn Store,
        diary_id: Uuid,
        member_id: Uuid,
        action: &str,
    ) -> AppResult<Diary> {
        let diary = store
            .find_diary(diary_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Diary not found".into()))?;

        if !diary.is_owned_by(member_id) {
            tracing::warn!(
                member_id = %member_id,
                diary_id = %diary_id,
                action,
                "Diary access by non-owner"
            );
            return Err(AppError::Forbidden(format!(
                "You can only {action} your own supplements"
            )));
        }
        Ok(diary)
    }
}

fn parse_intake_time(raw: Option<&str>) -> AppResult<Option<NaiveTime>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map(Some)
            .map_err(|_| AppError::Validation("Intake time must look like 08:30".into())),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::{DiaryCheckLogRepository, MemoryStore};

    fn request(name: &str) -> DiaryRequest {
        DiaryRequest {
            name: name.into(),
            memo: None,
            intake_time: None,
        }
    }

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    async fn registered(store: &MemoryStore, owner: Uuid, name: &str) -> Diary {
        DiaryService::create(store, &request(name), owner)
            .await
            .unwrap()
            .data
    }

    async fn active_logs_for(store: &MemoryStore, member: Uuid, diary: Uuid, date: NaiveDate) -> usize {
        DiaryService::find_history(store, member)
            .await
            .unwrap()
            .iter()
            .filter(|l| l.diary_id == diary && l.check_date == date)
            .count()
    }

    #[tokio::test]
    async fn create_registers_diary_for_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let req = DiaryRequest {
            name: "  Vitamin C ".into(),
            memo: Some("after lunch".into()),
            intake_time: Some("13:00".into()),
        };

        let outcome = DiaryService::create(&store, &req, owner).await.unwrap();
        assert_eq!(outcome.data.name, "Vitamin C");
        assert_eq!(outcome.data.member_id, owner);
        assert_eq!(outcome.data.intake_time, NaiveTime::from_hms_opt(13, 0, 0));
        assert!(outcome.message.contains("Vitamin C"));

        let list = DiaryService::get_list(&store, owner).await.unwrap();
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let store = MemoryStore::new();
        for name in ["", "   "] {
            let err = DiaryService::create(&store, &request(name), Uuid::new_v4())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "name {name:?}");
        }
    }

    #[tokio::test]
    async fn create_rejects_overlong_name_and_bad_time() {
        let store = MemoryStore::new();
        let err = DiaryService::create(&store, &request(&"a".repeat(101)), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let req = DiaryRequest {
            intake_time: Some("lunchtime".into()),
            ..request("Omega 3")
        };
        let err = DiaryService::create(&store, &req, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn memo_limit_is_inclusive() {
        let store = MemoryStore::new();
        let at_limit = DiaryRequest {
            memo: Some("m".repeat(crate::dto::DIARY_MEMO_MAX)),
            ..request("Lutein")
        };
        assert!(DiaryService::create(&store, &at_limit, Uuid::new_v4()).await.is_ok());

        let over = DiaryRequest {
            memo: Some("m".repeat(crate::dto::DIARY_MEMO_MAX + 1)),
            ..request("Lutein")
        };
        let err = DiaryService::create(&store, &over, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Memo must be at most 500 characters");
    }

    #[tokio::test]
    async fn list_keeps_insertion_order_and_owner_scope() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        registered(&store, owner, "Vitamin C").await;
        registered(&store, owner, "Magnesium").await;
        registered(&store, Uuid::new_v4(), "Iron").await;

        let names: Vec<String> = DiaryService::get_list(&store, owner)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Vitamin C", "Magnesium"]);
    }

    #[tokio::test]
    async fn delete_by_non_owner_is_forbidden() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let diary = registered(&store, owner, "Vitamin C").await;

        let err = DiaryService::delete(&store, diary.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(DiaryService::get_list(&store, owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_soft_deletes_and_hides_diary() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let diary = registered(&store, owner, "Vitamin C").await;

        let outcome = DiaryService::delete(&store, diary.id, owner).await.unwrap();
        assert!(outcome.data.deleted_at.is_some());
        assert!(DiaryService::get_list(&store, owner).await.unwrap().is_empty());

        // A second delete no longer sees the diary
        let err = DiaryService::delete(&store, diary.id, owner).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn toggle_on_missing_or_foreign_diary_fails_distinctly() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let diary = registered(&store, owner, "Vitamin C").await;

        let missing = DiaryService::toggle_check(&store, owner, Uuid::new_v4(), jan(1))
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));

        let foreign = DiaryService::toggle_check(&store, Uuid::new_v4(), diary.id, jan(1))
            .await
            .unwrap_err();
        assert!(matches!(foreign, AppError::Forbidden(_)));
        assert!(store.raw_check_logs().await.is_empty());
    }

    #[tokio::test]
    async fn toggle_alternates_and_never_converges() {
        let store = MemoryStore::new();
        let member = Uuid::new_v4();
        let diary = registered(&store, member, "Vitamin C").await;

        for call in 1..=6 {
            let outcome = DiaryService::toggle_check(&store, member, diary.id, jan(1))
                .await
                .unwrap();
            let odd = call % 2 == 1;
            assert_eq!(outcome.data.outcome.is_checked(), odd, "call {call}");
            assert_eq!(
                active_logs_for(&store, member, diary.id, jan(1)).await,
                usize::from(odd),
                "call {call}"
            );
        }
    }

    #[tokio::test]
    async fn vitamin_c_check_then_uncheck() {
        let store = MemoryStore::new();
        let member = Uuid::new_v4();
        let diary = registered(&store, member, "Vitamin C").await;

        let first = DiaryService::toggle_check(&store, member, diary.id, jan(1))
            .await
            .unwrap();
        assert!(first.data.outcome.is_checked());
        assert_eq!(active_logs_for(&store, member, diary.id, jan(1)).await, 1);

        let second = DiaryService::toggle_check(&store, member, diary.id, jan(1))
            .await
            .unwrap();
        assert!(!second.data.outcome.is_checked());
        assert_eq!(active_logs_for(&store, member, diary.id, jan(1)).await, 0);

        // Tombstoned, not dropped
        let raw = store.raw_check_logs().await;
        assert_eq!(raw.len(), 1);
        assert!(raw[0].deleted_at.is_some());
    }

    #[tokio::test]
    async fn toggles_on_different_dates_are_independent() {
        let store = MemoryStore::new();
        let member = Uuid::new_v4();
        let diary = registered(&store, member, "Vitamin C").await;

        DiaryService::toggle_check(&store, member, diary.id, jan(1)).await.unwrap();
        DiaryService::toggle_check(&store, member, diary.id, jan(2)).await.unwrap();
        DiaryService::toggle_check(&store, member, diary.id, jan(2)).await.unwrap();

        assert_eq!(active_logs_for(&store, member, diary.id, jan(1)).await, 1);
        assert_eq!(active_logs_for(&store, member, diary.id, jan(2)).await, 0);
    }

    #[tokio::test]
    async fn deleted_diary_cannot_be_toggled() {
        let store = MemoryStore::new();
        let member = Uuid::new_v4();
        let diary = registered(&store, member, "Vitamin C").await;
        DiaryService::delete(&store, diary.id, member).await.unwrap();

        let err = DiaryService::toggle_check(&store, member, diary.id, jan(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_toggles_keep_one_active_log() {
        let store = Arc::new(MemoryStore::new());
        let member = Uuid::new_v4();
        let diary = registered(&store, member, "Vitamin C").await;

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    DiaryService::toggle_check(store.as_ref(), member, diary.id, jan(1)).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Ten flips land back on unchecked; never more than one active row
        assert_eq!(active_logs_for(&store, member, diary.id, jan(1)).await, 0);
        let raw = store.raw_check_logs().await;
        assert_eq!(raw.len(), 5);
        assert!(raw.iter().all(|l| l.deleted_at.is_some()));
    }

    #[tokio::test]
    async fn history_spans_all_diaries_of_member() {
        let store = MemoryStore::new();
        let member = Uuid::new_v4();
        let other = Uuid::new_v4();
        let vitamin = registered(&store, member, "Vitamin C").await;
        let iron = registered(&store, member, "Iron").await;
        let foreign = registered(&store, other, "Zinc").await;

        DiaryService::toggle_check(&store, member, vitamin.id, jan(1)).await.unwrap();
        DiaryService::toggle_check(&store, member, iron.id, jan(3)).await.unwrap();
        DiaryService::toggle_check(&store, other, foreign.id, jan(1)).await.unwrap();

        let history = DiaryService::find_history(&store, member).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|l| l.member_id == member));
    }

    #[tokio::test]
    async fn status_on_marks_only_checked_diaries() {
        let store = MemoryStore::new();
        let member = Uuid::new_v4();
        let vitamin = registered(&store, member, "Vitamin C").await;
        registered(&store, member, "Iron").await;

        DiaryService::toggle_check(&store, member, vitamin.id, jan(5)).await.unwrap();

        let today = DiaryService::status_on(&store, member, jan(5)).await.unwrap();
        let checked: Vec<(&str, bool)> = today
            .iter()
            .map(|s| (s.diary.name.as_str(), s.checked))
            .collect();
        assert_eq!(checked, vec![("Vitamin C", true), ("Iron", false)]);

        let yesterday = DiaryService::status_on(&store, member, jan(4)).await.unwrap();
        assert!(yesterday.iter().all(|s| !s.checked));
    }

    #[tokio::test]
    async fn check_log_lookup_hides_tombstones_and_other_members() {
        let store = MemoryStore::new();
        let member = Uuid::new_v4();
        let diary = registered(&store, member, "Vitamin C").await;

        let checked = DiaryService::toggle_check(&store, member, diary.id, jan(1))
            .await
            .unwrap();
        let log_id = checked.data.outcome.log().id;

        let log = DiaryService::get_check_log(&store, member, log_id).await.unwrap();
        assert_eq!(log.diary_id, diary.id);

        let err = DiaryService::get_check_log(&store, Uuid::new_v4(), log_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        DiaryService::toggle_check(&store, member, diary.id, jan(1)).await.unwrap();
        assert!(store.find_check_log(log_id).await.unwrap().is_none());
    }
}
