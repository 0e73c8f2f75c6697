//! Fetch proxy route handlers.
//!
//! # Responsibilities
//! - Gate targets on the allow-list (`/filesystem`) or shared secret (`/proxy`)
//! - Issue the outbound GET and relay status, filtered headers and body
//! - Map network failures to 502/504 instead of crashing the request

use std::time::Instant;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use serde::Deserialize;

use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::proxy::headers::forward_headers;
use crate::proxy::stream::{FixedChunks, STREAM_CHUNK_BYTES};
use crate::resilience::backoff::calculate_backoff;

/// Query parameters accepted by both proxy routes.
#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    url: Option<String>,
    secret: Option<String>,
}

/// `GET /filesystem?url=<URL>`: public, allow-listed fetch proxy.
pub async fn filesystem(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
) -> Response {
    let started = Instant::now();

    // Allow-list gate before any outbound traffic.
    let target = params.url.filter(|url| state.allow_list.permits(url));
    let response = match target {
        Some(url) => fetch_and_stream(&state, &url, None, &state.public_cors)
            .await
            .unwrap_or_else(|err| err.into_response()),
        None => GatewayError::InvalidRequest(
            "Parameter \"url\" not found or illegal value".to_string(),
        )
        .into_response(),
    };

    metrics::record_request("GET", "/filesystem", response.status().as_u16(), started);
    response
}

/// `GET /proxy?secret=<token>&url=<URL>`: authenticated fetch proxy.
///
/// The secret is checked first; a bad secret answers 401 no matter what the
/// `url` parameter holds.
pub async fn authenticated(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
) -> Response {
    let started = Instant::now();

    let secret_ok =
        params.secret.as_deref() == Some(state.config.authenticated_proxy.secret.as_str());
    let response = if !secret_ok {
        GatewayError::Unauthorized.into_response()
    } else {
        match params.url {
            Some(url) => fetch_and_stream(
                &state,
                &url,
                Some(&state.proxy_user_agent),
                &state.proxy_cors,
            )
            .await
            .unwrap_or_else(|err| err.into_response()),
            None => GatewayError::InvalidRequest("Parameter \"url\" not found".to_string())
                .into_response(),
        }
    };

    metrics::record_request("GET", "/proxy", response.status().as_u16(), started);
    response
}

/// Fetch `url` and build the streaming relay response.
async fn fetch_and_stream(
    state: &AppState,
    url: &str,
    user_agent: Option<&HeaderValue>,
    cors_origin: &HeaderValue,
) -> Result<Response, GatewayError> {
    let retry = &state.config.upstream.retry;
    let max_attempts = if retry.enabled { retry.max_attempts.max(1) } else { 1 };

    // Connect-level failures on a GET are safe to retry; anything after the
    // request reached the upstream is not.
    let mut attempt = 0;
    let upstream_response = loop {
        attempt += 1;
        let mut request = state.upstream.get(url);
        if let Some(agent) = user_agent {
            request = request.header(header::USER_AGENT, agent.clone());
        }
        match request.send().await {
            Ok(response) => break response,
            Err(err) if err.is_connect() && attempt < max_attempts => {
                let delay = calculate_backoff(attempt, retry.base_delay_ms, retry.max_delay_ms);
                tracing::info!(
                    url,
                    attempt,
                    delay = ?delay,
                    "Retrying upstream fetch after connect error"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(GatewayError::Upstream(err.into())),
        }
    };

    tracing::debug!(
        url,
        status = %upstream_response.status(),
        "Relaying upstream response"
    );

    let status = upstream_response.status();
    let headers = forward_headers(upstream_response.headers(), cors_origin);
    let chunked = FixedChunks::new(
        upstream_response.bytes_stream().boxed(),
        STREAM_CHUNK_BYTES,
    );

    let mut response = Response::new(Body::from_stream(chunked));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
