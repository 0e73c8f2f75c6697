//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; level from config, `RUST_LOG` wins
//! - Request ID flows through log lines via the request-id layer
//! - Metrics are cheap (atomic increments) and exposed for Prometheus scrape

pub mod logging;
pub mod metrics;
