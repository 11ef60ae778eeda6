mod api_doc;
mod auth;
mod banner;
mod config;
mod db;
mod location;
mod logo;
mod news;
mod notification;
mod rate_limit;
mod response;
mod routes;
mod schema_ext;
mod upload;

use axum::http::HeaderValue;
use axum::{routing::get, Json, Router};
use dotenv::dotenv;
use serde_json::json;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::atomic::AtomicBool,
    sync::Arc,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::config::Config;
use crate::upload::{CloudinaryHost, ImageHost, UnconfiguredHost};

/// API index kept at `/` so external tools can discover the resource roots.
async fn api_index() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Narcotics Map API",
        "version": "1.0.0",
        "endpoints": {
            "auth": "/api/auth",
            "banner": "/api/banner",
            "logo": "/api/logo",
            "locations": "/api/locations",
            "news": "/api/news",
            "notifications": "/api/notifications"
        }
    }))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        // No explicit allowlist configured; default to permissive so
        // localhost development works out of the box.
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    tracing_subscriber::fmt::init();

    // Load .env file if it exists
    dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    // Lazy pool: the server comes up even while the database is unreachable,
    // the monitor task flips the write gate once it connects.
    let pool = db::connect_lazy(&config.database_url)?;

    if db::ping(&pool).await {
        if !db::check_db_initialized(&pool).await {
            db::init_db(&pool).await?;
        }
        if let Err(e) = auth::service::bootstrap_super_admin(&pool, &config).await {
            error!("Super admin bootstrap failed: {}", e.message());
        }
    } else {
        warn!("Database not reachable at startup, write endpoints return 503 until it connects");
    }

    let db_connected = Arc::new(AtomicBool::new(false));
    db::spawn_monitor(pool.clone(), db_connected.clone());

    // External image host, or a stand-in that rejects uploads with a clear
    // message when credentials are missing.
    let image_host: Arc<dyn ImageHost> = match &config.cloudinary {
        Some(cloudinary) => Arc::new(CloudinaryHost::new(cloudinary.clone())),
        None => Arc::new(UnconfiguredHost),
    };

    // API resource routes share the general rate limiter and the write gate;
    // health and docs stay outside so platform probes are never throttled.
    let api = Router::new()
        // Auth + admin management routes
        .merge(routes::auth::routes(pool.clone(), config.clone()))
        // Content routes
        .merge(routes::banner::routes(pool.clone(), image_host.clone()))
        .merge(routes::logo::routes(pool.clone(), image_host.clone()))
        .merge(routes::locations::routes(pool.clone()))
        .merge(routes::news::routes(pool.clone(), image_host.clone()))
        // Notification inbox routes
        .merge(routes::notifications::routes(pool.clone()))
        // Reject writes while the database is down
        .layer(axum::middleware::from_fn_with_state(
            db_connected.clone(),
            routes::write_gate,
        ));
    let api = rate_limit::with_api_rate_limit(api, config.trust_proxy);

    // Build the router
    let app = Router::new()
        // API documentation
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Health routes
        .merge(routes::health::routes(pool.clone(), config.cloudinary.is_some()))
        .merge(api)
        // API index routes
        .route("/", get(api_index))
        .route("/api", get(api_index))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http());

    let ip: IpAddr = config
        .host
        .parse()
        .unwrap_or_else(|_| IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    // Try a few ports in case the configured one is taken
    let mut port = config.port;
    let max_tries = 5;
    for attempt in 1..=max_tries {
        let addr = SocketAddr::from((ip, port));
        match axum::Server::try_bind(&addr) {
            Ok(server) => {
                info!("Server running on {}", addr);
                info!("API documentation: http://{}/docs", addr);
                info!(
                    "Cloudinary configured: {}",
                    if config.cloudinary.is_some() { "yes" } else { "no" }
                );
                return server
                    .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                    .await
                    .map_err(|e| e.into());
            }
            Err(_) => {
                if attempt == max_tries {
                    return Err("Failed to bind to any port".into());
                }
                warn!("Port {} in use, trying {}", port, port + 1);
                port += 1;
            }
        }
    }

    Err("Failed to bind to any port".into())
}
