use axum::{routing::get, Router};
use sqlx::PgPool;

use crate::location::controller;

/// Location routes. Reads are public; create/update/delete authenticate
/// through the `AuthUser` extractor since the paths mix public and admin
/// methods.
pub fn routes(pool: PgPool) -> Router {
    Router::new()
        .route(
            "/api/locations",
            get(controller::list).post(controller::create),
        )
        .route("/api/locations/statistics", get(controller::statistics))
        .route(
            "/api/locations/:id",
            get(controller::get)
                .put(controller::update)
                .delete(controller::delete),
        )
        .with_state(pool)
}
