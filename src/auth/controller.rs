use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use super::middleware::AuthUser;
use super::service::{self, AdminRecord, AuthError, AuthResult, LoginData, RegisterData, UpdateData};
use crate::config::Config;
use crate::response::{error_response_detailed, ApiResponse, ErrorBody};

pub type AuthState = (PgPool, Arc<Config>);

// Request DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub identifier: String,
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

// Response DTOs
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub identifier: String,
    pub username: String,
    pub display_name: String,
    pub role: String,
}

fn to_login_response(result: AuthResult) -> LoginResponse {
    LoginResponse {
        token: result.token,
        identifier: result.identifier,
        username: result.username,
        display_name: result.name,
        role: result.role,
    }
}

// Convert AuthError to Response
fn handle_error(error: AuthError, dev_mode: bool) -> Response {
    let status = error.status_code();
    let message = error.message();

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Internal server error: {}", message);
    } else {
        info!("Auth error: {} ({})", message, status);
    }

    let detail = match &error {
        AuthError::DatabaseError(details) if dev_mode => Some(details.clone()),
        _ => None,
    };

    error_response_detailed(status, message, detail)
}

/// Log in with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    ),
    tag = "authentication"
)]
pub async fn login(
    State((pool, config)): State<AuthState>,
    Json(req): Json<LoginRequest>,
) -> Response {
    info!("Login request received for username: {}", req.username);

    let data = LoginData {
        username: req.username,
        password: req.password,
    };

    match service::login(&pool, data).await {
        Ok(result) => {
            let response = to_login_response(result);
            (
                StatusCode::OK,
                Json(ApiResponse::with_message("Login successful", response)),
            )
                .into_response()
        }
        Err(error) => handle_error(error, config.dev_mode),
    }
}

/// Register a new admin (super admin only)
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Admin created", body = AdminRecord),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Caller may not manage admins", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "authentication"
)]
pub async fn register(
    user: AuthUser,
    State((pool, config)): State<AuthState>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    info!("Registration request received for username: {}", req.username);

    let data = RegisterData {
        identifier: req.identifier,
        username: req.username,
        password: req.password,
        name: req.name,
        role: req.role,
    };

    match service::register(&pool, &user, data).await {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::with_message("Admin added successfully", record)),
        )
            .into_response(),
        Err(error) => handle_error(error, config.dev_mode),
    }
}

/// Current admin from the bearer token
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current admin", body = AdminRecord),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "authentication"
)]
pub async fn me(user: AuthUser, State((pool, config)): State<AuthState>) -> Response {
    match service::me(&pool, &user.identifier).await {
        Ok(record) => Json(ApiResponse::data(record)).into_response(),
        Err(error) => handle_error(error, config.dev_mode),
    }
}

/// List all admin accounts (super admin only)
#[utoipa::path(
    get,
    path = "/api/auth/users",
    responses(
        (status = 200, description = "Admin list", body = [AdminRecord]),
        (status = 403, description = "Caller may not manage admins", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "authentication"
)]
pub async fn list_users(user: AuthUser, State((pool, config)): State<AuthState>) -> Response {
    match service::list(&pool, &user).await {
        Ok(records) => Json(ApiResponse::data(records)).into_response(),
        Err(error) => handle_error(error, config.dev_mode),
    }
}

/// Update an admin account
#[utoipa::path(
    put,
    path = "/api/auth/users/{id}",
    params(("id" = String, Path, description = "Admin identifier")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Admin updated", body = AdminRecord),
        (status = 403, description = "Protected record", body = ErrorBody),
        (status = 404, description = "Admin not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "authentication"
)]
pub async fn update_user(
    user: AuthUser,
    State((pool, config)): State<AuthState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Response {
    let data = UpdateData {
        username: req.username,
        name: req.name,
        is_active: req.is_active,
    };

    match service::update(&pool, &user, &config.super_admin_id, &id, data).await {
        Ok(record) => Json(ApiResponse::with_message("Admin updated successfully", record))
            .into_response(),
        Err(error) => handle_error(error, config.dev_mode),
    }
}

/// Deactivate an admin account (super admin only)
#[utoipa::path(
    delete,
    path = "/api/auth/users/{id}",
    params(("id" = String, Path, description = "Admin identifier")),
    responses(
        (status = 200, description = "Admin deactivated", body = String),
        (status = 403, description = "Protected record or missing permission", body = ErrorBody),
        (status = 404, description = "Admin not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "authentication"
)]
pub async fn delete_user(
    user: AuthUser,
    State((pool, config)): State<AuthState>,
    Path(id): Path<String>,
) -> Response {
    match service::deactivate(&pool, &user, &config.super_admin_id, &id).await {
        Ok(()) => Json(ApiResponse::message("Admin deactivated successfully")).into_response(),
        Err(error) => handle_error(error, config.dev_mode),
    }
}

/// Reset an admin's password
#[utoipa::path(
    put,
    path = "/api/auth/users/{id}/reset-password",
    params(("id" = String, Path, description = "Admin identifier")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = String),
        (status = 400, description = "Password too short", body = ErrorBody),
        (status = 403, description = "Protected record or missing permission", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "authentication"
)]
pub async fn reset_password(
    user: AuthUser,
    State((pool, config)): State<AuthState>,
    Path(id): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> Response {
    match service::reset_password(&pool, &user, &config.super_admin_id, &id, &req.new_password)
        .await
    {
        Ok(()) => Json(ApiResponse::message("Password reset successfully")).into_response(),
        Err(error) => handle_error(error, config.dev_mode),
    }
}
