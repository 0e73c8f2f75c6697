//! Sync point persistence subsystem.
//!
//! # Data Flow
//! ```text
//! sync handler
//!     → run_blocking (off the async runtime)
//!     → sqlite.rs (mutex-guarded connection, atomic upsert)
//!     → SyncPoint records back to the handler
//! ```

pub mod model;
pub mod sqlite;

pub use model::SyncPoint;
pub use sqlite::{run_blocking, SqliteSyncStore, SyncStoreError};
