use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::notification::model::{Notification, NotificationError};
use crate::notification::service::NotificationService;
use crate::response::{error_response, ApiResponse, ErrorBody};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListParams {
    /// Only return notifications the current admin has not read yet
    pub unread: Option<bool>,
    /// Maximum number of notifications to return
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCount {
    pub count: i64,
}

fn handle_error(error: NotificationError) -> Response {
    match error {
        NotificationError::NotFound => {
            error_response(StatusCode::NOT_FOUND, "Notification not found")
        }
        NotificationError::DatabaseError(e) => {
            error!("Notification store error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Notification store error")
        }
    }
}

/// Admin notification inbox, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(
        ("unread" = Option<bool>, Query, description = "Only unread notifications"),
        ("limit" = Option<i64>, Query, description = "Maximum number of notifications")
    ),
    responses(
        (status = 200, description = "Notifications for the current admin", body = [Notification]),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn list(
    user: AuthUser,
    State(pool): State<PgPool>,
    Query(params): Query<ListParams>,
) -> Response {
    let service = NotificationService::new(pool);

    match service
        .list(&user.identifier, params.unread.unwrap_or(false), params.limit)
        .await
    {
        Ok(notifications) => Json(ApiResponse::data(notifications)).into_response(),
        Err(error) => handle_error(error),
    }
}

/// Number of unread notifications for the current admin
#[utoipa::path(
    get,
    path = "/api/notifications/count",
    responses(
        (status = 200, description = "Unread count", body = UnreadCount),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn count_unread(user: AuthUser, State(pool): State<PgPool>) -> Response {
    let service = NotificationService::new(pool);

    match service.count_unread(&user.identifier).await {
        Ok(count) => Json(ApiResponse::data(UnreadCount { count })).into_response(),
        Err(error) => handle_error(error),
    }
}

/// Mark one notification read for the current admin (idempotent)
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    params(("id" = i64, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 404, description = "Notification not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_read(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Response {
    let service = NotificationService::new(pool);

    match service.mark_read(id, &user.identifier).await {
        Ok(notification) => Json(ApiResponse::data(notification)).into_response(),
        Err(error) => handle_error(error),
    }
}

/// Mark every notification read for the current admin
#[utoipa::path(
    patch,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked read", body = String),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_all_read(user: AuthUser, State(pool): State<PgPool>) -> Response {
    let service = NotificationService::new(pool);

    match service.mark_all_read(&user.identifier).await {
        Ok(_) => Json(ApiResponse::message(
            "All notifications marked as read for current admin",
        ))
        .into_response(),
        Err(error) => handle_error(error),
    }
}
