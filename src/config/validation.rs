//! Configuration validation.
//!
//! Serde handles syntactic checks; this module covers the semantic ones:
//! allow-list prefixes must be absolute http(s) URLs, header values must be
//! encodable, durations must be non-zero. All violations are collected and
//! reported together, not just the first.

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic violation in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("public_proxy.allowed_prefixes entry {0:?} is not an absolute http(s) URL")]
    InvalidAllowedPrefix(String),

    #[error("{field} value {value:?} is not a valid header value")]
    InvalidHeaderValue { field: &'static str, value: String },

    #[error("sync.location_base {0:?} is not an absolute http(s) URL")]
    InvalidLocationBase(String),

    #[error("authenticated_proxy.secret must not be empty")]
    EmptySecret,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("upstream.retry.max_attempts must be at least 1 when retries are enabled")]
    ZeroRetryAttempts,
}

/// Validate a deserialized configuration, returning all violations found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for prefix in &config.public_proxy.allowed_prefixes {
        if !is_http_url(prefix) {
            errors.push(ValidationError::InvalidAllowedPrefix(prefix.clone()));
        }
    }

    let header_fields = [
        ("public_proxy.cors_origin", &config.public_proxy.cors_origin),
        (
            "authenticated_proxy.cors_origin",
            &config.authenticated_proxy.cors_origin,
        ),
        (
            "authenticated_proxy.user_agent",
            &config.authenticated_proxy.user_agent,
        ),
        ("sync.cors_origin", &config.sync.cors_origin),
    ];
    for (field, value) in header_fields {
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidHeaderValue {
                field,
                value: value.clone(),
            });
        }
    }

    if !is_http_url(&config.sync.location_base) {
        errors.push(ValidationError::InvalidLocationBase(
            config.sync.location_base.clone(),
        ));
    }

    if config.authenticated_proxy.secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.request_secs"));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("upstream.connect_timeout_secs"));
    }
    if config.upstream.read_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("upstream.read_timeout_secs"));
    }

    if config.upstream.retry.enabled && config.upstream.retry.max_attempts == 0 {
        errors.push(ValidationError::ZeroRetryAttempts);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(value: &str) -> bool {
    matches!(
        Url::parse(value),
        Ok(url) if url.scheme() == "http" || url.scheme() == "https"
    )
}
