//! Gateway error taxonomy and HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::SyncStoreError;

/// Errors surfaced to HTTP clients.
///
/// Input errors carry the exact response body the legacy endpoints promised;
/// the web client matches on those strings.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or disallowed input on a proxy route (answered with 404).
    #[error("{0}")]
    InvalidRequest(String),

    /// Malformed sync request body (answered with 400).
    #[error("{0}")]
    BadRequest(String),

    /// Missing or wrong shared secret.
    #[error("401 Unauthorized")]
    Unauthorized,

    /// Store-level failure during a sync operation.
    #[error(transparent)]
    Storage(#[from] SyncStoreError),

    /// Network-level failure while fetching from an upstream.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Classified outbound fetch failure.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream timed out: {0}")]
    Timeout(String),

    #[error("upstream connect failed: {0}")]
    Connect(String),

    #[error("upstream protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Protocol(err.to_string())
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidRequest(message) => (StatusCode::NOT_FOUND, message).into_response(),
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": 400, "error": message })),
            )
                .into_response(),
            Self::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "401 Unauthorized").into_response()
            }
            Self::Storage(err) => {
                tracing::error!(error = %err, "Store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "status": 500, "error": err.to_string() })),
                )
                    .into_response()
            }
            Self::Upstream(UpstreamError::Timeout(message)) => {
                tracing::warn!(error = %message, "Upstream fetch timed out");
                (StatusCode::GATEWAY_TIMEOUT, "Upstream request timed out").into_response()
            }
            Self::Upstream(err) => {
                tracing::warn!(error = %err, "Upstream fetch failed");
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
        }
    }
}
