use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::controller::{self, AuthState};
use crate::auth::middleware::auth_middleware;
use crate::config::Config;
use crate::rate_limit::with_auth_rate_limit;

/// Authentication and admin management routes. Login and registration sit
/// behind the stricter auth rate limiter.
pub fn routes(pool: PgPool, config: Arc<Config>) -> Router {
    let trust_proxy = config.trust_proxy;
    let state: AuthState = (pool, config);

    let login = Router::new()
        .route("/api/auth/login", post(controller::login))
        .with_state(state.clone());

    let register = Router::new()
        .route("/api/auth/register", post(controller::register))
        .route_layer(middleware::from_fn(auth_middleware))
        .with_state(state.clone());

    let management = Router::new()
        .route("/api/auth/me", get(controller::me))
        .route("/api/auth/users", get(controller::list_users))
        .route(
            "/api/auth/users/:id",
            put(controller::update_user).delete(controller::delete_user),
        )
        .route(
            "/api/auth/users/:id/reset-password",
            put(controller::reset_password),
        )
        .route_layer(middleware::from_fn(auth_middleware))
        .with_state(state);

    with_auth_rate_limit(login.merge(register), trust_proxy).merge(management)
}
