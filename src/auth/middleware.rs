use axum::{
    async_trait,
    extract::FromRequestParts,
    headers::{authorization::Bearer, Authorization},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
    RequestPartsExt, TypedHeader,
};
use tracing::{error, info};

use super::jwt::{validate_token, Claims, Role};
use crate::response::error_response;

/// Authenticated admin information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identifier: String,
    pub username: String,
    pub name: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            identifier: claims.sub,
            username: claims.username,
            name: claims.name,
            role: claims.role,
        }
    }
}

async fn authenticate(parts: &mut Parts) -> Result<AuthUser, Response> {
    // Extract the token from the Authorization header
    let bearer = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(e) => {
            error!("Authorization header extraction failed: {:?}", e);
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                "Missing or invalid Authorization header. Please provide a Bearer token",
            ));
        }
    };

    // Validate the token
    let claims = match validate_token(bearer.token()) {
        Ok(claims) => claims,
        Err(e) => {
            error!("Token validation failed: {:?}", e);
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                "Invalid token. Please login again",
            ));
        }
    };

    info!(
        "Admin authenticated: {} with role {:?}",
        claims.sub, claims.role
    );

    Ok(AuthUser::from(claims))
}

/// Authentication middleware for routers that are admin-only end to end
pub async fn auth_middleware<B>(req: Request<B>, next: Next<B>) -> Result<Response, Response> {
    let (mut parts, body) = req.into_parts();

    let auth_user = authenticate(&mut parts).await?;
    parts.extensions.insert(auth_user);

    // Continue with the request
    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Restrict a route to roles with notification-inbox access. Must run after
/// `auth_middleware`.
pub async fn require_admin<B>(req: Request<B>, next: Next<B>) -> Result<Response, Response> {
    let auth_user = match req.extensions().get::<AuthUser>() {
        Some(user) => user.clone(),
        None => {
            error!("AuthUser not found in request extensions");
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                "Authentication required",
            ));
        }
    };

    if !auth_user.role.can_view_notifications() {
        error!(
            "Insufficient permissions for admin {} with role {:?}",
            auth_user.identifier, auth_user.role
        );
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "Insufficient permissions",
        ));
    }

    Ok(next.run(req).await)
}

/// Extractor for the authenticated admin.
///
/// Uses the identity placed in request extensions by `auth_middleware` when
/// present, otherwise validates the bearer token itself. Routers that mix
/// public and admin methods on one path rely on the extractor alone;
/// `Option<AuthUser>` makes the same check optional for public routes that
/// merely change behavior when a valid token is supplied.
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        authenticate(parts).await
    }
}
