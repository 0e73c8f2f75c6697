//! Persisted sync point record.

use serde::Serialize;
use serde_json::Value;

/// A single key/value synchronization record.
///
/// At most one record exists per `key`. `id` is assigned by the store on
/// first insert and never changes afterwards, including across updates to
/// the same key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncPoint {
    /// Store-assigned identity.
    pub id: i64,

    /// Unique lookup key, owned by the client.
    pub key: String,

    /// Opaque client payload. Validated JSON at the API boundary; never
    /// spliced into responses as raw text.
    pub value: Value,
}
