use axum::{
    middleware,
    routing::{get, patch},
    Router,
};
use sqlx::PgPool;

use crate::auth::middleware::{auth_middleware, require_admin};
use crate::notification::controller;

/// Admin notification inbox. Every route requires a bearer token with a role
/// that may view notifications.
pub fn routes(pool: PgPool) -> Router {
    Router::new()
        .route("/api/notifications", get(controller::list))
        .route("/api/notifications/count", get(controller::count_unread))
        .route("/api/notifications/read-all", patch(controller::mark_all_read))
        .route("/api/notifications/:id/read", patch(controller::mark_read))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn(auth_middleware))
        .with_state(pool)
}
