use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::middleware::auth_middleware;
use crate::logo::controller::{self, LogoState};
use crate::upload::ImageHost;

const LOGO_UPLOAD_LIMIT: usize = 2 * 1024 * 1024; // 2MB

pub fn routes(pool: PgPool, host: Arc<dyn ImageHost>) -> Router {
    let state: LogoState = (pool, host);

    let public = Router::new()
        .route("/api/logo/active", get(controller::get_active))
        .with_state(state.clone());

    let private = Router::new()
        .route("/api/logo", get(controller::list).post(controller::save))
        .route(
            "/api/logo/:id",
            patch(controller::patch).delete(controller::delete),
        )
        .route_layer(DefaultBodyLimit::max(LOGO_UPLOAD_LIMIT))
        .route_layer(middleware::from_fn(auth_middleware))
        .with_state(state);

    public.merge(private)
}
