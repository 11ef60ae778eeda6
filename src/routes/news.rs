use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;

use crate::news::controller::{self, NewsState};
use crate::upload::ImageHost;

const NEWS_UPLOAD_LIMIT: usize = 5 * 1024 * 1024; // 5MB

/// News routes. Reads are public; create/update/delete authenticate through
/// the `AuthUser` extractor since the paths mix public and admin methods.
pub fn routes(pool: PgPool, host: Arc<dyn ImageHost>) -> Router {
    let state: NewsState = (pool, host);

    Router::new()
        .route("/api/news", get(controller::list).post(controller::create))
        .route(
            "/api/news/:id",
            get(controller::get)
                .put(controller::update)
                .delete(controller::delete),
        )
        .route_layer(DefaultBodyLimit::max(NEWS_UPLOAD_LIMIT))
        .with_state(state)
}
