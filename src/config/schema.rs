//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Public fetch proxy (prefix allow-list).
    pub public_proxy: PublicProxyConfig,

    /// Authenticated fetch proxy (shared secret).
    pub authenticated_proxy: AuthenticatedProxyConfig,

    /// Outbound HTTP client settings.
    pub upstream: UpstreamConfig,

    /// Sync endpoint settings.
    pub sync: SyncConfig,

    /// Sync point store settings.
    pub store: StoreConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Public fetch proxy configuration (`/filesystem`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PublicProxyConfig {
    /// URL prefixes permitted as fetch targets. An empty list permits nothing.
    pub allowed_prefixes: Vec<String>,

    /// Value of the injected `Access-Control-Allow-Origin` header.
    pub cors_origin: String,
}

impl Default for PublicProxyConfig {
    fn default() -> Self {
        Self {
            allowed_prefixes: Vec::new(),
            cors_origin: "http://localhost:8000".to_string(),
        }
    }
}

/// Authenticated fetch proxy configuration (`/proxy`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthenticatedProxyConfig {
    /// Shared secret required in the `secret` query parameter.
    pub secret: String,

    /// Value of the injected `Access-Control-Allow-Origin` header.
    pub cors_origin: String,

    /// User-Agent sent on outbound fetches. Some feed hosts refuse requests
    /// without a browser-looking agent string.
    pub user_agent: String,
}

impl Default for AuthenticatedProxyConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            secret: "CHANGE_ME_IN_PRODUCTION".to_string(),
            cors_origin: "http://localhost:8000".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.11 \
                         (KHTML, like Gecko) Chrome/23.0.1271.64 Safari/537.11"
                .to_string(),
        }
    }
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Timeout between reads from the upstream in seconds.
    pub read_timeout_secs: u64,

    /// Retry configuration for connect-level failures.
    pub retry: RetryConfig,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            read_timeout_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Sync endpoint configuration (`/sync`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Value of the `Access-Control-Allow-Origin` header on sync responses.
    pub cors_origin: String,

    /// Base URL used to build the `Location` header on successful saves.
    pub location_base: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cors_origin: "http://localhost:8000".to_string(),
            location_base: "http://localhost:8080/sync".to_string(),
        }
    }
}

/// Sync point store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,

    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("db/sync.db"),
            busy_timeout_ms: 5_000,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (time until response headers are produced) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
