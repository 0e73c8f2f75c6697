//! Sync endpoint handlers.
//!
//! # Responsibilities
//! - Parse and validate `{key, value}` save requests
//! - Drive the store (upsert / lookup) off the async runtime
//! - Shape the legacy JSON envelopes (`status` + `saved` / `entries`)

use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::store::{run_blocking, SyncPoint};

/// Query parameters for `GET /sync`.
#[derive(Debug, Deserialize)]
pub struct SyncQuery {
    key: Option<String>,
}

/// `POST|PUT /sync`: upsert a sync point.
///
/// Answers 201 with the persisted record and a `Location` pointing at the
/// corresponding `GET`.
pub async fn save_sync_point(
    State(state): State<AppState>,
    method: Method,
    Json(body): Json<Value>,
) -> Response {
    let started = Instant::now();

    let response = match parse_save_request(&body) {
        Ok((key, value)) => {
            let store = state.store.clone();
            match run_blocking(move || store.save(&key, &value)).await {
                Ok(record) => created_response(&state, record),
                Err(err) => GatewayError::Storage(err).into_response(),
            }
        }
        Err(err) => err.into_response(),
    };

    metrics::record_request(method.as_str(), "/sync", response.status().as_u16(), started);
    response
}

/// `GET /sync?key=<string>`: fetch matching sync points.
///
/// A missing or unknown key answers an empty `entries` list, never an
/// error; the web client probes for state it may not have written yet.
pub async fn list_sync_points(
    State(state): State<AppState>,
    Query(query): Query<SyncQuery>,
) -> Response {
    let started = Instant::now();

    let response = match query.key.filter(|key| !key.is_empty()) {
        None => entries_response(Vec::new()),
        Some(key) => {
            let store = state.store.clone();
            match run_blocking(move || store.get(&key)).await {
                Ok(record) => entries_response(record.into_iter().collect()),
                Err(err) => GatewayError::Storage(err).into_response(),
            }
        }
    };

    metrics::record_request("GET", "/sync", response.status().as_u16(), started);
    response
}

/// `DELETE /sync`: deliberately rejected.
///
/// The store keeps a delete primitive, but no client ever calls it over
/// HTTP; answering 405 keeps that surface closed instead of undefined.
pub async fn reject_delete() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed").into_response()
}

/// Extract and validate `key`/`value` from a save request body.
fn parse_save_request(body: &Value) -> Result<(String, Value), GatewayError> {
    let key = body
        .get("key")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let value = body.get("value").cloned().unwrap_or(Value::Null);
    if key.is_empty() || value.is_null() {
        return Err(GatewayError::BadRequest(
            "request body requires non-empty \"key\" and \"value\" fields".to_string(),
        ));
    }
    Ok((key.to_string(), value))
}

fn created_response(state: &AppState, record: SyncPoint) -> Response {
    let location = format!("{}?key={}", state.config.sync.location_base, record.key);
    let mut response = (
        StatusCode::CREATED,
        Json(json!({ "status": 201, "saved": record })),
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}

fn entries_response(entries: Vec<SyncPoint>) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "status": 200, "entries": entries })),
    )
        .into_response()
}
