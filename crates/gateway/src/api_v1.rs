//! HTTP API v1: the publish trigger surface.
//!
//! Endpoints:
//!
//! - `POST /v1/publish`  Run one publish invocation
//! - `POST /v1/resolve`  Preview publish-time token resolution

use axum::{
    Router,
    extract::State,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::Json,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use cardpress_config::AppConfig;
use cardpress_core::error::PublishError;
use cardpress_core::token::{self, TokenTable};
use cardpress_publisher::{PublishReceipt, PublishRequest, Publisher};

// ── State ─────────────────────────────────────────────────────────────────

/// Shared state for the v1 API.
pub struct ApiV1State {
    pub publisher: Publisher,
    pub config: AppConfig,
}

pub type SharedApiState = Arc<ApiV1State>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/publish", post(publish_handler))
        .route("/resolve", post(resolve_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable outcome, e.g. `missing_parameter`
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_body: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

impl ErrorResponse {
    fn from_publish_error(err: &PublishError) -> ApiError {
        let upstream = err.upstream_body().is_some();
        (
            response_status(err),
            Json(Self {
                error: err.kind().to_string(),
                message: err.to_string(),
                upstream_status: upstream.then(|| err.status_code()),
                upstream_body: err.upstream_body().map(String::from),
            }),
        )
    }

    fn invalid_request(rejection: JsonRejection) -> ApiError {
        (
            StatusCode::BAD_REQUEST,
            Json(Self {
                error: "invalid_request".into(),
                message: rejection.body_text(),
                upstream_status: None,
                upstream_body: None,
            }),
        )
    }
}

/// Caller-facing status for a failed publish.
///
/// Upstream statuses pass through when they are error statuses; anything
/// else an upstream could report (1xx/3xx oddities) becomes 502.
fn response_status(err: &PublishError) -> StatusCode {
    StatusCode::from_u16(err.status_code())
        .ok()
        .filter(|status| status.is_client_error() || status.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

#[derive(Deserialize)]
struct ResolveRequest {
    text: String,
    #[serde(default)]
    static_tokens: TokenTable,
}

#[derive(Serialize)]
struct ResolveResponse {
    text: String,
    /// Static tokens left in place because the table has no value for them
    unresolved: Vec<String>,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn publish_handler(
    State(state): State<SharedApiState>,
    payload: Result<Json<PublishRequest>, JsonRejection>,
) -> Result<Json<PublishReceipt>, ApiError> {
    let Json(request) = payload.map_err(ErrorResponse::invalid_request)?;
    let request = request.with_defaults(&state.config);

    match state.publisher.publish(&request).await {
        Ok(receipt) => {
            info!(card_id = %receipt.card_id, "Publish invocation succeeded");
            Ok(Json(receipt))
        }
        Err(e) => {
            warn!(error = %e, status = e.status_code(), "Publish invocation failed");
            Err(ErrorResponse::from_publish_error(&e))
        }
    }
}

async fn resolve_handler(
    State(state): State<SharedApiState>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let Json(mut req) = payload.map_err(ErrorResponse::invalid_request)?;

    let mut tokens = state.config.tokens.clone();
    tokens.append(&mut req.static_tokens);

    Ok(Json(ResolveResponse {
        text: token::resolve(&req.text, &tokens),
        unresolved: token::unresolved_static_tokens(&req.text, &tokens),
    }))
}
