use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sqlx::PgPool;
use tracing::error;

use crate::auth::middleware::AuthUser;
use crate::location::model::{
    CreateLocationRequest, Location, LocationError, NeighborhoodStat, UpdateLocationRequest,
};
use crate::location::service::LocationService;
use crate::response::{error_response, ApiResponse, ErrorBody};

fn handle_error(error: LocationError) -> Response {
    match error {
        LocationError::NotFound => error_response(StatusCode::NOT_FOUND, "Location not found"),
        LocationError::InvalidInput(msg) => error_response(StatusCode::BAD_REQUEST, msg),
        LocationError::DatabaseError(e) => {
            error!("Location store error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Location store error")
        }
    }
}

/// All map markers (public)
#[utoipa::path(
    get,
    path = "/api/locations",
    responses(
        (status = 200, description = "All locations", body = [Location])
    ),
    tag = "locations"
)]
pub async fn list(State(pool): State<PgPool>) -> Response {
    match LocationService::new(pool).list().await {
        Ok(locations) => Json(ApiResponse::data(locations)).into_response(),
        Err(error) => handle_error(error),
    }
}

/// Case totals per neighborhood (public)
#[utoipa::path(
    get,
    path = "/api/locations/statistics",
    responses(
        (status = 200, description = "Per-neighborhood statistics", body = [NeighborhoodStat])
    ),
    tag = "locations"
)]
pub async fn statistics(State(pool): State<PgPool>) -> Response {
    match LocationService::new(pool).statistics().await {
        Ok(stats) => Json(ApiResponse::data(stats)).into_response(),
        Err(error) => handle_error(error),
    }
}

/// Single map marker (public)
#[utoipa::path(
    get,
    path = "/api/locations/{id}",
    params(("id" = i64, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location", body = Location),
        (status = 404, description = "Location not found", body = ErrorBody)
    ),
    tag = "locations"
)]
pub async fn get(State(pool): State<PgPool>, Path(id): Path<i64>) -> Response {
    match LocationService::new(pool).get(id).await {
        Ok(location) => Json(ApiResponse::data(location)).into_response(),
        Err(error) => handle_error(error),
    }
}

/// Add a map marker (admin). Emits a best-effort inbox notification.
#[utoipa::path(
    post,
    path = "/api/locations",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = Location),
        (status = 400, description = "Invalid input", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "locations"
)]
pub async fn create(
    user: AuthUser,
    State(pool): State<PgPool>,
    Json(req): Json<CreateLocationRequest>,
) -> Response {
    match LocationService::new(pool).create(&user, req).await {
        Ok(location) => (
            StatusCode::CREATED,
            Json(ApiResponse::with_message("Location added successfully", location)),
        )
            .into_response(),
        Err(error) => handle_error(error),
    }
}

/// Update a map marker (admin)
#[utoipa::path(
    put,
    path = "/api/locations/{id}",
    params(("id" = i64, Path, description = "Location id")),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Location updated", body = Location),
        (status = 404, description = "Location not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "locations"
)]
pub async fn update(
    _user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateLocationRequest>,
) -> Response {
    match LocationService::new(pool).update(id, req).await {
        Ok(location) => Json(ApiResponse::with_message(
            "Location updated successfully",
            location,
        ))
        .into_response(),
        Err(error) => handle_error(error),
    }
}

/// Remove a map marker (admin)
#[utoipa::path(
    delete,
    path = "/api/locations/{id}",
    params(("id" = i64, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location deleted", body = String),
        (status = 404, description = "Location not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "locations"
)]
pub async fn delete(
    _user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Response {
    match LocationService::new(pool).delete(id).await {
        Ok(()) => Json(ApiResponse::message("Location deleted successfully")).into_response(),
        Err(error) => handle_error(error),
    }
}
