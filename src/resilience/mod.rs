//! Resilience helpers for outbound fetches.
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//!   (enforced on the outbound client, see `UpstreamConfig`)
//! - Retries only for connect-level failures on idempotent requests
//! - Jittered backoff prevents thundering herd

pub mod backoff;
