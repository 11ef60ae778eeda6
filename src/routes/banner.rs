use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::middleware::auth_middleware;
use crate::banner::controller::{self, BannerState};
use crate::upload::ImageHost;

const BANNER_UPLOAD_LIMIT: usize = 5 * 1024 * 1024; // 5MB

pub fn routes(pool: PgPool, host: Arc<dyn ImageHost>) -> Router {
    let state: BannerState = (pool, host);

    let public = Router::new()
        .route("/api/banner/active", get(controller::get_active))
        .with_state(state.clone());

    let private = Router::new()
        .route(
            "/api/banner",
            get(controller::list).post(controller::save),
        )
        .route(
            "/api/banner/:id",
            patch(controller::patch).delete(controller::delete),
        )
        .route_layer(DefaultBodyLimit::max(BANNER_UPLOAD_LIMIT))
        .route_layer(middleware::from_fn(auth_middleware))
        .with_state(state);

    public.merge(private)
}
