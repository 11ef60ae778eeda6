use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::news::model::{NewsError, NewsFields, NewsResponse, Pagination};
use crate::news::service::{NewsQuery, NewsService};
use crate::response::{error_response, ApiResponse, ErrorBody};
use crate::upload::{parse_image_form, ImageForm, ImageHost};

pub type NewsState = (PgPool, Arc<dyn ImageHost>);

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub include_unpublished: Option<bool>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsDetailParams {
    pub skip_view_count: Option<bool>,
}

/// List envelope with pagination metadata alongside the data.
#[derive(Debug, Serialize, ToSchema)]
pub struct NewsListResponse {
    pub success: bool,
    pub data: Vec<NewsResponse>,
    pub pagination: Pagination,
}

fn handle_error(error: NewsError) -> Response {
    match error {
        NewsError::NotFound => error_response(StatusCode::NOT_FOUND, "News not found"),
        NewsError::InvalidInput(msg) => error_response(StatusCode::BAD_REQUEST, msg),
        NewsError::Upload(e) => {
            error!("News upload error: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Image upload failed: {}", e),
            )
        }
        NewsError::DatabaseError(e) => {
            error!("News store error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "News store error")
        }
    }
}

fn news_fields(form: &ImageForm) -> NewsFields {
    NewsFields {
        title: form.fields.get("title").cloned(),
        content: form.fields.get("content").cloned(),
        is_published: form
            .fields
            .get("isPublished")
            .map(|v| matches!(v.as_str(), "true" | "1")),
    }
}

/// Paginated news list. Published articles are public; `includeUnpublished`
/// is only honored with a valid bearer token.
#[utoipa::path(
    get,
    path = "/api/news",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("includeUnpublished" = Option<bool>, Query, description = "Admins only: include drafts"),
        ("search" = Option<String>, Query, description = "Search across title, content and author"),
        ("sort" = Option<String>, Query, description = "newest | oldest | most-viewed | title")
    ),
    responses(
        (status = 200, description = "Paginated news list", body = NewsListResponse)
    ),
    tag = "news"
)]
pub async fn list(
    user: Option<AuthUser>,
    State((pool, host)): State<NewsState>,
    Query(params): Query<NewsListParams>,
) -> Response {
    let query = NewsQuery {
        page: params.page,
        limit: params.limit,
        include_unpublished: params.include_unpublished.unwrap_or(false) && user.is_some(),
        search: params.search,
        sort: params.sort,
    };

    match NewsService::new(pool, host).list(query).await {
        Ok((data, pagination)) => Json(NewsListResponse {
            success: true,
            data,
            pagination,
        })
        .into_response(),
        Err(error) => handle_error(error),
    }
}

/// Single article (public). Each fetch counts one view unless
/// `skipViewCount=true` — the admin panel uses that, and the public client
/// keeps its own per-viewer 24h dedup.
#[utoipa::path(
    get,
    path = "/api/news/{id}",
    params(
        ("id" = i64, Path, description = "News id"),
        ("skipViewCount" = Option<bool>, Query, description = "Do not count this fetch as a view")
    ),
    responses(
        (status = 200, description = "News article", body = NewsResponse),
        (status = 404, description = "News not found", body = ErrorBody)
    ),
    tag = "news"
)]
pub async fn get(
    State((pool, host)): State<NewsState>,
    Path(id): Path<i64>,
    Query(params): Query<NewsDetailParams>,
) -> Response {
    let count_view = !params.skip_view_count.unwrap_or(false);

    match NewsService::new(pool, host).get(id, count_view).await {
        Ok(news) => Json(ApiResponse::data(news)).into_response(),
        Err(error) => handle_error(error),
    }
}

/// Create an article (admin, multipart with `image`)
#[utoipa::path(
    post,
    path = "/api/news",
    responses(
        (status = 201, description = "News created", body = NewsResponse),
        (status = 400, description = "Missing image, title or content", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "news"
)]
pub async fn create(
    user: AuthUser,
    State((pool, host)): State<NewsState>,
    multipart: Multipart,
) -> Response {
    let form = match parse_image_form(multipart).await {
        Ok(form) => form,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let fields = news_fields(&form);
    let Some(image) = form.image else {
        return error_response(StatusCode::BAD_REQUEST, "News image is required");
    };

    match NewsService::new(pool, host).create(&user, fields, image).await {
        Ok(news) => (
            StatusCode::CREATED,
            Json(ApiResponse::with_message("News created successfully", news)),
        )
            .into_response(),
        Err(error) => handle_error(error),
    }
}

/// Update an article, optionally replacing its image (admin)
#[utoipa::path(
    put,
    path = "/api/news/{id}",
    params(("id" = i64, Path, description = "News id")),
    responses(
        (status = 200, description = "News updated", body = NewsResponse),
        (status = 404, description = "News not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "news"
)]
pub async fn update(
    _user: AuthUser,
    State((pool, host)): State<NewsState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Response {
    let form = match parse_image_form(multipart).await {
        Ok(form) => form,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let fields = news_fields(&form);

    match NewsService::new(pool, host).update(id, fields, form.image).await {
        Ok(news) => Json(ApiResponse::with_message("News updated successfully", news))
            .into_response(),
        Err(error) => handle_error(error),
    }
}

/// Delete an article and its image asset (admin)
#[utoipa::path(
    delete,
    path = "/api/news/{id}",
    params(("id" = i64, Path, description = "News id")),
    responses(
        (status = 200, description = "News deleted", body = String),
        (status = 404, description = "News not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "news"
)]
pub async fn delete(
    _user: AuthUser,
    State((pool, host)): State<NewsState>,
    Path(id): Path<i64>,
) -> Response {
    match NewsService::new(pool, host).delete(id).await {
        Ok(()) => Json(ApiResponse::message("News deleted successfully")).into_response(),
        Err(error) => handle_error(error),
    }
}
