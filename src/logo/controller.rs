use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use crate::auth::middleware::AuthUser;
use crate::logo::model::{Logo, LogoError, LogoFields, PatchLogoRequest};
use crate::logo::service::LogoService;
use crate::response::{error_response, ApiResponse, ErrorBody};
use crate::upload::{parse_image_form, ImageHost};

pub type LogoState = (PgPool, Arc<dyn ImageHost>);

fn handle_error(error: LogoError) -> Response {
    match error {
        LogoError::NotFound => error_response(StatusCode::NOT_FOUND, "Logo not found"),
        LogoError::Upload(e) => {
            error!("Logo upload error: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Image upload failed: {}", e),
            )
        }
        LogoError::DatabaseError(e) => {
            error!("Logo store error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Logo store error")
        }
    }
}

/// Active logo (public)
#[utoipa::path(
    get,
    path = "/api/logo/active",
    responses(
        (status = 200, description = "Currently active logo, null when none", body = Logo)
    ),
    tag = "logo"
)]
pub async fn get_active(State((pool, host)): State<LogoState>) -> Response {
    match LogoService::new(pool, host).get_active().await {
        Ok(logo) => Json(ApiResponse::data(logo)).into_response(),
        Err(error) => handle_error(error),
    }
}

/// All logos (admin)
#[utoipa::path(
    get,
    path = "/api/logo",
    responses((status = 200, description = "All logos", body = [Logo])),
    security(("bearer_auth" = [])),
    tag = "logo"
)]
pub async fn list(_user: AuthUser, State((pool, host)): State<LogoState>) -> Response {
    match LogoService::new(pool, host).list().await {
        Ok(logos) => Json(ApiResponse::data(logos)).into_response(),
        Err(error) => handle_error(error),
    }
}

/// Replace or create the active logo (admin, multipart with `image`)
#[utoipa::path(
    post,
    path = "/api/logo",
    responses(
        (status = 200, description = "Logo replaced", body = Logo),
        (status = 201, description = "Logo created", body = Logo),
        (status = 400, description = "Missing or invalid image", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "logo"
)]
pub async fn save(
    _user: AuthUser,
    State((pool, host)): State<LogoState>,
    multipart: Multipart,
) -> Response {
    let form = match parse_image_form(multipart).await {
        Ok(form) => form,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let Some(image) = form.image else {
        return error_response(StatusCode::BAD_REQUEST, "Logo image is required");
    };

    let fields = LogoFields {
        title: form.fields.get("title").cloned(),
        subtitle: form.fields.get("subtitle").cloned(),
    };

    match LogoService::new(pool, host).save(fields, image).await {
        Ok((logo, created)) => {
            let status = if created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            let message = if created {
                "Logo created successfully"
            } else {
                "Logo updated successfully"
            };
            (status, Json(ApiResponse::with_message(message, logo))).into_response()
        }
        Err(error) => handle_error(error),
    }
}

/// Update logo text without replacing the image (admin)
#[utoipa::path(
    patch,
    path = "/api/logo/{id}",
    params(("id" = i64, Path, description = "Logo id")),
    request_body = PatchLogoRequest,
    responses(
        (status = 200, description = "Logo updated", body = Logo),
        (status = 404, description = "Logo not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "logo"
)]
pub async fn patch(
    _user: AuthUser,
    State((pool, host)): State<LogoState>,
    Path(id): Path<i64>,
    Json(req): Json<PatchLogoRequest>,
) -> Response {
    match LogoService::new(pool, host).patch(id, req.title, req.subtitle).await {
        Ok(logo) => Json(ApiResponse::with_message("Logo updated successfully", logo))
            .into_response(),
        Err(error) => handle_error(error),
    }
}

/// Delete a logo and its image asset (admin)
#[utoipa::path(
    delete,
    path = "/api/logo/{id}",
    params(("id" = i64, Path, description = "Logo id")),
    responses(
        (status = 200, description = "Logo deleted", body = String),
        (status = 404, description = "Logo not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "logo"
)]
pub async fn delete(
    _user: AuthUser,
    State((pool, host)): State<LogoState>,
    Path(id): Path<i64>,
) -> Response {
    match LogoService::new(pool, host).delete(id).await {
        Ok(()) => Json(ApiResponse::message("Logo deleted successfully")).into_response(),
        Err(error) => handle_error(error),
    }
}
