//! Key/value synchronization endpoint.
//!
//! # Data Flow
//! ```text
//! POST|PUT /sync {"key": .., "value": ..}
//!     → handler.rs (validate body)
//!     → store (atomic upsert)
//!     → 201 {"status": 201, "saved": {id, key, value}} + Location
//!
//! GET /sync?key=..
//!     → handler.rs
//!     → store (lookup)
//!     → 200 {"status": 200, "entries": [..]}
//! ```

pub mod handler;
