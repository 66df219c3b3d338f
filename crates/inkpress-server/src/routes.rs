//! Route table.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{pages, users};
use crate::state::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Pages
        .route("/", get(pages::home))
        .route("/login", get(pages::login))
        .route("/write", get(pages::write))
        .route("/admin", get(pages::admin))
        // Authentication API
        .route("/users", post(users::signup))
        .route("/users/log-in", post(users::login))
        .route("/users/refresh", post(users::refresh))
        .route("/users/log-out", post(users::logout))
        .route("/users/me", get(users::me))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
