use axum::{extract::State, http::HeaderMap, response::Redirect, Extension, Json};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::middleware::AuthUser;
use crate::dto::MyOrderResponse;
use crate::error::AppResult;
use crate::flash::{flash_redirect, page, Page};
use crate::services::order::OrderService;
use crate::AppState;

/// POST /order/create, checks out the whole cart
pub async fn checkout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    jar: CookieJar,
    headers: HeaderMap,
) -> AppResult<(CookieJar, Redirect)> {
    auth_user.require_buyer()?;

    let result = OrderService::checkout(state.store.as_ref(), auth_user.id).await;
    flash_redirect(jar, &headers, result, "/buyer/myOrder", "/cart")
}

/// GET /buyer/myOrder
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Page<MyOrderResponse>>)> {
    auth_user.require_buyer()?;

    let orders = OrderService::my_orders(state.store.as_ref(), auth_user.id).await?;
    let (jar, view) = page(jar, orders);
    Ok((jar, Json(view)))
}
