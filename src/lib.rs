// Library exports for the server binary and tests
pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use config::Config;
use db::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

/// Every route of the service, with auth and request tracing applied.
/// CORS is left to the binary since it depends on the deployment.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    let buyer_routes = Router::new()
        // Diary
        .route(
            "/diary/create",
            get(handlers::diary::create_form).post(handlers::diary::create),
        )
        .route("/diary/list", get(handlers::diary::list))
        .route(
            "/diary/list/delete/:diary_id",
            post(handlers::diary::delete),
        )
        .route("/diary/todolist", get(handlers::diary::todo_list))
        .route(
            "/diary/todolist/check/:log_id",
            get(handlers::diary::check_log),
        )
        .route(
            "/diary/todolist/toggleCheck/:diary_id",
            post(handlers::diary::toggle_check),
        )
        // Cart
        .route("/cart", get(handlers::cart::view))
        .route("/cart/add", post(handlers::cart::add))
        .route(
            "/cart/update/:cart_product_id",
            post(handlers::cart::update_quantity),
        )
        // Orders
        .route("/order/create", post(handlers::order::checkout))
        .route("/buyer/myOrder", get(handlers::order::my_orders))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(buyer_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
