//! Fetch proxy subsystem.
//!
//! # Data Flow
//! ```text
//! GET /filesystem?url=...  or  GET /proxy?secret=...&url=...
//!     → handler.rs (allow-list / secret gate)
//!     → outbound GET via shared reqwest client
//!     → headers.rs (strip Server*/Set-Cookie*, inject CORS origin)
//!     → stream.rs (re-chunk body into fixed 16 KiB buffers)
//!     → client
//! ```

pub mod allowlist;
pub mod handler;
pub mod headers;
pub mod stream;

pub use allowlist::UrlAllowList;
