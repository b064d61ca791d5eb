use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::HeaderMap,
    response::Redirect,
    Extension, Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::dto::{CreateFormResponse, DiaryListResponse, DiaryRequest, TodoListResponse};
use crate::error::AppResult;
use crate::flash::{flash_redirect, page, read_form, Page};
use crate::models::check_log::DiaryCheckLog;
use crate::services::diary::DiaryService;
use crate::AppState;

/// GET /diary/create
pub async fn create_form(
    Extension(auth_user): Extension<AuthUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Page<CreateFormResponse>>)> {
    auth_user.require_buyer()?;

    let (jar, view) = page(jar, CreateFormResponse::default());
    Ok((jar, Json(view)))
}

/// POST /diary/create
pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    jar: CookieJar,
    headers: HeaderMap,
    form: Result<Form<DiaryRequest>, FormRejection>,
) -> AppResult<(CookieJar, Redirect)> {
    auth_user.require_buyer()?;

    let result = match read_form(form) {
        Ok(body) => DiaryService::create(state.store.as_ref(), &body, auth_user.id).await,
        Err(e) => Err(e),
    };
    flash_redirect(jar, &headers, result, "/diary/list", "/diary/create")
}

/// GET /diary/list
pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Page<DiaryListResponse>>)> {
    auth_user.require_buyer()?;

    let diaries = DiaryService::get_list(state.store.as_ref(), auth_user.id).await?;
    let (jar, view) = page(jar, DiaryListResponse::new(diaries));
    Ok((jar, Json(view)))
}

/// POST /diary/list/delete/{diary_id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(diary_id): Path<Uuid>,
    jar: CookieJar,
    headers: HeaderMap,
) -> AppResult<(CookieJar, Redirect)> {
    auth_user.require_buyer()?;

    let result = DiaryService::delete(state.store.as_ref(), diary_id, auth_user.id).await;
    flash_redirect(jar, &headers, result, "/diary/list", "/diary/list")
}

/// GET /diary/todolist: today's supplements plus the check history by day
pub async fn todo_list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Page<TodoListResponse>>)> {
    auth_user.require_buyer()?;

    let today = state.config.today();
    let store = state.store.as_ref();
    let statuses = DiaryService::status_on(store, auth_user.id, today).await?;
    let history = DiaryService::find_history(store, auth_user.id).await?;

    let (jar, view) = page(jar, TodoListResponse::new(today, statuses, history));
    Ok((jar, Json(view)))
}

/// GET /diary/todolist/check/{log_id}
pub async fn check_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(log_id): Path<Uuid>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Page<DiaryCheckLog>>)> {
    auth_user.require_buyer()?;

    let log = DiaryService::get_check_log(state.store.as_ref(), auth_user.id, log_id).await?;
    let (jar, view) = page(jar, log);
    Ok((jar, Json(view)))
}

/// POST /diary/todolist/toggleCheck/{diary_id}, flips today's check
pub async fn toggle_check(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(diary_id): Path<Uuid>,
    jar: CookieJar,
    headers: HeaderMap,
) -> AppResult<(CookieJar, Redirect)> {
    auth_user.require_buyer()?;

    let today = state.config.today();
    let result =
        DiaryService::toggle_check(state.store.as_ref(), auth_user.id, diary_id, today).await;
    flash_redirect(jar, &headers, result, "/diary/todolist", "/diary/todolist")
}
