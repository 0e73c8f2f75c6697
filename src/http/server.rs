//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, sync CORS header)
//! - Build the shared outbound client and application state
//! - Bind the server to a listener and run until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::http::request::RequestIdLayer;
use crate::proxy::{self, UrlAllowList};
use crate::store::{run_blocking, SqliteSyncStore};
use crate::sync;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    /// Shared outbound client; owns connect/read timeouts and TLS defaults.
    pub upstream: reqwest::Client,
    pub store: SqliteSyncStore,
    pub allow_list: Arc<UrlAllowList>,
    pub public_cors: HeaderValue,
    pub proxy_cors: HeaderValue,
    pub proxy_user_agent: HeaderValue,
}

/// Errors building the server from a validated configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid header value in configuration: {0}")]
    Header(#[from] axum::http::header::InvalidHeaderValue),
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and store.
    pub fn new(config: GatewayConfig, store: SqliteSyncStore) -> Result<Self, ServerError> {
        let config = Arc::new(config);

        let upstream = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.upstream.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.upstream.read_timeout_secs))
            .build()?;

        let state = AppState {
            allow_list: Arc::new(UrlAllowList::new(
                config.public_proxy.allowed_prefixes.clone(),
            )),
            public_cors: HeaderValue::from_str(&config.public_proxy.cors_origin)?,
            proxy_cors: HeaderValue::from_str(&config.authenticated_proxy.cors_origin)?,
            proxy_user_agent: HeaderValue::from_str(&config.authenticated_proxy.user_agent)?,
            config: Arc::clone(&config),
            upstream,
            store,
        };

        let router = Self::build_router(&config, state)?;
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Result<Router, ServerError> {
        // Every /sync response carries the CORS header, error paths included,
        // so it rides a layer instead of each handler.
        let sync_cors = HeaderValue::from_str(&config.sync.cors_origin)?;
        let sync_routes = Router::new()
            .route(
                "/sync",
                get(sync::handler::list_sync_points)
                    .post(sync::handler::save_sync_point)
                    .put(sync::handler::save_sync_point)
                    .delete(sync::handler::reject_delete),
            )
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                sync_cors,
            ));

        Ok(Router::new()
            .route("/filesystem", get(proxy::handler::filesystem))
            .route("/proxy", get(proxy::handler::authenticated))
            .route("/health", get(health))
            .merge(sync_routes)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http()))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Liveness probe backed by the store readiness check.
async fn health(State(state): State<AppState>) -> Response {
    let store = state.store.clone();
    match run_blocking(move || store.readiness()).await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "Store readiness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "store unavailable").into_response()
        }
    }
}
