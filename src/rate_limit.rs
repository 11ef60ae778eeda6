//! Rate limiting layers built on `tower_governor`.
//!
//! Two limiters cover the API surface:
//! - general API: ~100 requests per 15 minutes per client IP
//! - auth endpoints (login/register): ~10 requests per 15 minutes per client IP
//!
//! The client key is the peer address, or the forwarded-for headers when the
//! deployment fronts the service with a trusted proxy (`TRUST_PROXY`).

use axum::{error_handling::HandleErrorLayer, BoxError, Router};
use tower::ServiceBuilder;
use tower_governor::errors::display_error;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor};
use tower_governor::GovernorLayer;

/// Wrap `$router` with a GCRA limiter replenishing one request every
/// `$per_second` seconds, allowing a burst of `$burst`. Over-limit requests
/// are rejected, not queued.
macro_rules! governed {
    ($router:expr, $key:expr, $per_second:expr, $burst:expr) => {{
        let config = Box::new(
            GovernorConfigBuilder::default()
                .key_extractor($key)
                .per_second($per_second)
                .burst_size($burst)
                .finish()
                .expect("rate limiter quota is a valid positive configuration"),
        );
        $router.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|e: BoxError| async move {
                    display_error(e)
                }))
                .layer(GovernorLayer {
                    config: Box::leak(config),
                }),
        )
    }};
}

/// General API limiter: one request per 9 seconds, burst of 100
/// (~100 requests per 15 minutes).
pub fn with_api_rate_limit(router: Router, trust_proxy: bool) -> Router {
    if trust_proxy {
        governed!(router, SmartIpKeyExtractor, 9, 100)
    } else {
        governed!(router, PeerIpKeyExtractor, 9, 100)
    }
}

/// Stricter limiter protecting login and registration from brute force:
/// one request per 90 seconds, burst of 10 (~10 requests per 15 minutes).
pub fn with_auth_rate_limit(router: Router, trust_proxy: bool) -> Router {
    if trust_proxy {
        governed!(router, SmartIpKeyExtractor, 90, 10)
    } else {
        governed!(router, PeerIpKeyExtractor, 90, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_layers_build() {
        // A bad quota configuration would panic here rather than at runtime.
        let _ = with_api_rate_limit(Router::new(), true);
        let _ = with_api_rate_limit(Router::new(), false);
        let _ = with_auth_rate_limit(Router::new(), true);
        let _ = with_auth_rate_limit(Router::new(), false);
    }
}
