//! HTTP trigger surface for Cardpress.
//!
//! Exposes a health check and the v1 API that runs publish invocations.
//! Each request is one independent invocation; the gateway holds no
//! mutable state between them.
//!
//! Built on Axum for high performance async HTTP.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::{self, Next},
    response::Json,
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use cardpress_config::AppConfig;
use cardpress_publisher::Publisher;
use cardpress_stores::HttpStore;

/// Build the full router: `/health` plus the v1 API under `/v1`.
///
/// Layers applied:
/// - Bearer token authentication on all /v1 routes (when configured)
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(api_state: api_v1::SharedApiState) -> Router {
    let v1 = api_v1::v1_router(api_state.clone())
        .layer(middleware::from_fn_with_state(api_state, auth_middleware));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", v1)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Build the publisher the gateway serves, talking HTTP to both sides.
pub fn build_publisher(config: &AppConfig) -> cardpress_core::Result<Publisher> {
    let store = Arc::new(HttpStore::from_config(&config.http)?);
    Ok(Publisher::new(store.clone(), store).with_destination_prefix(config.destination.prefix.clone()))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> cardpress_core::Result<()> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    if config.gateway.api_token.is_none() {
        warn!("No gateway.api_token configured; /v1 routes are unauthenticated");
    }

    let api_state = Arc::new(api_v1::ApiV1State {
        publisher: build_publisher(&config)?,
        config,
    });

    let app = build_router(api_state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Authentication middleware for the /v1 API.
///
/// When `gateway.api_token` is set, requires a matching
/// `Authorization: Bearer <token>` header. Without a token, all requests pass.
async fn auth_middleware(
    State(state): State<api_v1::SharedApiState>,
    req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    let Some(expected) = state.config.gateway.api_token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match auth_header {
        Some(token) if token == expected => Ok(next.run(req).await),
        _ => {
            warn!("Unauthorized request to /v1 API: missing or invalid bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
