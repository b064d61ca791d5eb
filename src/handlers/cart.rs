use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::HeaderMap,
    response::Redirect,
    Extension, Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::dto::{AddToCartRequest, CartResponse, QuantityRequest};
use crate::error::AppResult;
use crate::flash::{flash_redirect, page, read_form, Page};
use crate::services::cart::CartService;
use crate::AppState;

/// GET /cart
pub async fn view(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Page<CartResponse>>)> {
    auth_user.require_buyer()?;

    let cart = CartService::view(state.store.as_ref(), auth_user.id).await?;
    let (jar, view) = page(jar, cart);
    Ok((jar, Json(view)))
}

/// POST /cart/add
pub async fn add(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    jar: CookieJar,
    headers: HeaderMap,
    form: Result<Form<AddToCartRequest>, FormRejection>,
) -> AppResult<(CookieJar, Redirect)> {
    auth_user.require_buyer()?;

    let result = match read_form(form) {
        Ok(body) => {
            CartService::add_product(
                state.store.as_ref(),
                auth_user.id,
                body.product_id,
                body.quantity,
            )
            .await
        }
        Err(e) => Err(e),
    };
    flash_redirect(jar, &headers, result, "/cart", "/cart")
}

/// POST /cart/update/{cart_product_id}
pub async fn update_quantity(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(cart_product_id): Path<Uuid>,
    jar: CookieJar,
    headers: HeaderMap,
    form: Result<Form<QuantityRequest>, FormRejection>,
) -> AppResult<(CookieJar, Redirect)> {
    auth_user.require_buyer()?;

    let result = match read_form(form) {
        Ok(body) => {
            CartService::update_quantity(
                state.store.as_ref(),
                auth_user.id,
                cart_product_id,
                body.quantity,
            )
            .await
        }
        Err(e) => Err(e),
    };
    flash_redirect(jar, &headers, result, "/cart", "/cart")
}
