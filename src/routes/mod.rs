pub mod auth;
pub mod banner;
pub mod health;
pub mod locations;
pub mod logo;
pub mod news;
pub mod notifications;

use axum::{
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::response::error_response;

/// Reject mutating requests while the database is unreachable. Reads are
/// allowed through and surface their own store errors if the query fails.
pub async fn write_gate<B>(
    State(db_connected): State<Arc<AtomicBool>>,
    req: Request<B>,
    next: Next<B>,
) -> Result<Response, Response> {
    let mutating = matches!(req.method().as_str(), "POST" | "PUT" | "PATCH" | "DELETE");

    if mutating && !db_connected.load(Ordering::Relaxed) {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Service temporarily unavailable - database not connected",
        ));
    }

    Ok(next.run(req).await)
}
