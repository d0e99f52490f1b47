//! Shared state and HTTP API for the Keymint issuance service.
//!
//! The transport owns request parsing, token authentication, and the
//! error-to-status mapping; every issuance decision lives in
//! [`keymint_license`].

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use keymint_license::{HistoryRecord, Issuer};
use serde::Deserialize;

/// Service-wide state: the engine plus the edge authentication token.
pub struct AppState {
    pub issuer: Issuer,
    pub api_token: String,
}

/// Issuance request body.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub token: String,
    pub machine_id: String,
    pub expiry: String,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    token: String,
}

async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Response {
    if req.token != state.api_token {
        return (StatusCode::FORBIDDEN, "invalid token").into_response();
    }

    // RSA signing and the ledger's disk write are blocking work.
    let worker = Arc::clone(&state);
    let result =
        tokio::task::spawn_blocking(move || worker.issuer.issue(&req.machine_id, &req.expiry))
            .await;

    match result {
        Ok(Ok(code)) => (StatusCode::OK, code).into_response(),
        Ok(Err(err)) => {
            tracing::warn!(%err, "issuance failed");
            let status = if err.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, err.to_string()).into_response()
        }
        Err(err) => {
            tracing::error!(%err, "issuance task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

async fn history_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    if query.token != state.api_token {
        return (StatusCode::FORBIDDEN, "invalid token").into_response();
    }

    let mut records: Vec<HistoryRecord> = state.issuer.ledger().records();
    records.reverse();
    Json(records).into_response()
}

async fn health_handler() -> &'static str {
    "OK"
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/generate", post(generate_handler))
        .route("/api/history", get(history_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}
