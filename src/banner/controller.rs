use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use crate::auth::middleware::AuthUser;
use crate::banner::model::{
    BannerError, BannerFields, BannerResponse, ImagePosition, PatchBannerRequest,
};
use crate::banner::service::BannerService;
use crate::response::{error_response, ApiResponse, ErrorBody};
use crate::upload::{parse_image_form, ImageHost};

pub type BannerState = (PgPool, Arc<dyn ImageHost>);

fn handle_error(error: BannerError) -> Response {
    match error {
        BannerError::NotFound => error_response(StatusCode::NOT_FOUND, "Banner not found"),
        BannerError::InvalidInput(msg) => error_response(StatusCode::BAD_REQUEST, msg),
        BannerError::Upload(e) => {
            error!("Banner upload error: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Image upload failed: {}", e),
            )
        }
        BannerError::DatabaseError(e) => {
            error!("Banner store error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Banner store error")
        }
    }
}

/// Active banner (public)
#[utoipa::path(
    get,
    path = "/api/banner/active",
    responses(
        (status = 200, description = "Currently active banner, null when none", body = BannerResponse)
    ),
    tag = "banner"
)]
pub async fn get_active(State((pool, host)): State<BannerState>) -> Response {
    match BannerService::new(pool, host).get_active().await {
        Ok(banner) => Json(ApiResponse::data(banner)).into_response(),
        Err(error) => handle_error(error),
    }
}

/// All banners (admin)
#[utoipa::path(
    get,
    path = "/api/banner",
    responses(
        (status = 200, description = "All banners", body = [BannerResponse])
    ),
    security(("bearer_auth" = [])),
    tag = "banner"
)]
pub async fn list(_user: AuthUser, State((pool, host)): State<BannerState>) -> Response {
    match BannerService::new(pool, host).list().await {
        Ok(banners) => Json(ApiResponse::data(banners)).into_response(),
        Err(error) => handle_error(error),
    }
}

/// Replace or create the active banner (admin, multipart with `image`)
#[utoipa::path(
    post,
    path = "/api/banner",
    responses(
        (status = 200, description = "Banner replaced", body = BannerResponse),
        (status = 201, description = "Banner created", body = BannerResponse),
        (status = 400, description = "Missing or invalid image", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "banner"
)]
pub async fn save(
    _user: AuthUser,
    State((pool, host)): State<BannerState>,
    multipart: Multipart,
) -> Response {
    let form = match parse_image_form(multipart).await {
        Ok(form) => form,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let Some(image) = form.image else {
        return error_response(StatusCode::BAD_REQUEST, "Image is required");
    };

    let fields = BannerFields {
        caption: form.fields.get("caption").cloned(),
        location: form.fields.get("location").cloned(),
        image_fit: form.fields.get("imageFit").cloned(),
        image_position: form
            .fields
            .get("imagePosition")
            .map(|raw| ImagePosition::parse_lenient(raw)),
    };

    match BannerService::new(pool, host).save(fields, image).await {
        Ok((banner, created)) => {
            let status = if created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            let message = if created {
                "Banner created successfully"
            } else {
                "Banner updated successfully"
            };
            (status, Json(ApiResponse::with_message(message, banner))).into_response()
        }
        Err(error) => handle_error(error),
    }
}

/// Update banner text and layout without replacing the image (admin)
#[utoipa::path(
    patch,
    path = "/api/banner/{id}",
    params(("id" = i64, Path, description = "Banner id")),
    request_body = PatchBannerRequest,
    responses(
        (status = 200, description = "Banner updated", body = BannerResponse),
        (status = 404, description = "Banner not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "banner"
)]
pub async fn patch(
    _user: AuthUser,
    State((pool, host)): State<BannerState>,
    Path(id): Path<i64>,
    Json(req): Json<PatchBannerRequest>,
) -> Response {
    match BannerService::new(pool, host)
        .patch(id, req.caption, req.location, req.image_fit, req.image_position)
        .await
    {
        Ok(banner) => Json(ApiResponse::with_message("Banner updated successfully", banner))
            .into_response(),
        Err(error) => handle_error(error),
    }
}

/// Delete a banner and its image asset (admin)
#[utoipa::path(
    delete,
    path = "/api/banner/{id}",
    params(("id" = i64, Path, description = "Banner id")),
    responses(
        (status = 200, description = "Banner deleted", body = String),
        (status = 404, description = "Banner not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "banner"
)]
pub async fn delete(
    _user: AuthUser,
    State((pool, host)): State<BannerState>,
    Path(id): Path<i64>,
) -> Response {
    match BannerService::new(pool, host).delete(id).await {
        Ok(()) => Json(ApiResponse::message("Banner deleted successfully")).into_response(),
        Err(error) => handle_error(error),
    }
}
