use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

use crate::db;

#[derive(Serialize, ToSchema)]
pub struct HealthServices {
    pub cloudinary: bool,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub db: String,
    pub services: HealthServices,
}

pub type HealthState = (PgPool, bool);

/// Health check for load balancers and container probes
///
/// Reports process, database-connection and image-host-configuration status.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health_check(State((pool, cloudinary_configured)): State<HealthState>) -> impl IntoResponse {
    let db_status = if db::ping(&pool).await {
        "connected"
    } else {
        "disconnected"
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            success: true,
            status: "ok".to_string(),
            db: db_status.to_string(),
            services: HealthServices {
                cloudinary: cloudinary_configured,
            },
        }),
    )
}

/// Exposed on both `/health` and `/api/health` so platform probes reach it
/// regardless of path rewriting in front of the service.
pub fn routes(pool: PgPool, cloudinary_configured: bool) -> Router {
    let state: HealthState = (pool, cloudinary_configured);
    Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .with_state(state)
}
