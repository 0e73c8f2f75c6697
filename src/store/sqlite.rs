//! SQLite-backed sync point store.
//!
//! # Responsibilities
//! - Own the `sync_points` table and its schema
//! - Upsert-by-key as a single atomic statement
//! - Surface storage faults as errors, never as sentinel data
//!
//! # Design Decisions
//! - One connection guarded by a mutex; SQLite serializes writers anyway and
//!   the busy timeout absorbs contention from other processes
//! - `INSERT ... ON CONFLICT(key) DO UPDATE` keeps the at-most-one-record-
//!   per-key invariant without a check-then-act window

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use thiserror::Error;

use crate::config::StoreConfig;
use crate::store::model::SyncPoint;

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS sync_points (
    id INTEGER PRIMARY KEY,
    key TEXT NOT NULL UNIQUE,
    value TEXT NOT NULL
)";

/// Sync store errors.
#[derive(Debug, Error, Clone)]
pub enum SyncStoreError {
    /// Filesystem-level failure opening or creating the database.
    #[error("sync store io error: {0}")]
    Io(String),

    /// SQLite engine error.
    #[error("sync store db error: {0}")]
    Db(String),

    /// A stored value is no longer parseable JSON.
    #[error("sync store corruption: {0}")]
    Corrupt(String),
}

fn db_err(err: rusqlite::Error) -> SyncStoreError {
    SyncStoreError::Db(err.to_string())
}

/// SQLite-backed store for [`SyncPoint`] records.
#[derive(Clone)]
pub struct SqliteSyncStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteSyncStore {
    /// Open (and initialize if needed) the store at the configured path.
    pub fn open(config: &StoreConfig) -> Result<Self, SyncStoreError> {
        ensure_parent_dir(&config.path)?;
        let connection = Connection::open(&config.path).map_err(db_err)?;
        connection
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(db_err)?;
        connection
            .pragma_update(None, "journal_mode", "wal")
            .map_err(db_err)?;
        connection.execute(SCHEMA_SQL, []).map_err(db_err)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SyncStoreError> {
        self.connection
            .lock()
            .map_err(|_| SyncStoreError::Db("sync store mutex poisoned".to_string()))
    }

    /// Upsert a record by key and return the persisted row.
    ///
    /// Insert and update run as one statement, so concurrent saves on the
    /// same new key cannot produce two rows. The row id survives updates.
    pub fn save(&self, key: &str, value: &Value) -> Result<SyncPoint, SyncStoreError> {
        let value_text = value.to_string();
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO sync_points (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value_text],
            )
            .map_err(db_err)?;
        let record = select_by_key(&guard, key)?;
        record.ok_or_else(|| SyncStoreError::Db(format!("row missing after upsert of key {key:?}")))
    }

    /// Fetch a record by exact key. Absent keys are `Ok(None)`, not an error.
    pub fn get(&self, key: &str) -> Result<Option<SyncPoint>, SyncStoreError> {
        let guard = self.lock()?;
        select_by_key(&guard, key)
    }

    /// Remove a record by key. Returns whether a row was deleted.
    ///
    /// Not reachable from any HTTP route; kept as a store primitive.
    pub fn delete(&self, key: &str) -> Result<bool, SyncStoreError> {
        let guard = self.lock()?;
        let deleted = guard
            .execute("DELETE FROM sync_points WHERE key = ?1", params![key])
            .map_err(db_err)?;
        Ok(deleted > 0)
    }

    /// List every record in id order.
    pub fn list(&self) -> Result<Vec<SyncPoint>, SyncStoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare("SELECT id, key, value FROM sync_points ORDER BY id")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(db_err)?;
        let mut records = Vec::new();
        for row in rows {
            let (id, key, value_text) = row.map_err(db_err)?;
            records.push(build_record(id, key, &value_text)?);
        }
        Ok(records)
    }

    /// Verify the store can execute a trivial query.
    pub fn readiness(&self) -> Result<(), SyncStoreError> {
        let guard = self.lock()?;
        guard
            .query_row("SELECT 1", [], |_| Ok(()))
            .map_err(db_err)
    }
}

/// Run a store operation on the blocking thread pool.
///
/// Handlers are async; rusqlite is not. Everything that touches the
/// connection goes through here so the runtime never blocks on disk I/O.
pub async fn run_blocking<T, F>(task: F) -> Result<T, SyncStoreError>
where
    F: FnOnce() -> Result<T, SyncStoreError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result,
        Err(err) => Err(SyncStoreError::Db(format!("store task failed: {err}"))),
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), SyncStoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|err| SyncStoreError::Io(err.to_string()))?;
        }
    }
    Ok(())
}

fn select_by_key(
    connection: &Connection,
    key: &str,
) -> Result<Option<SyncPoint>, SyncStoreError> {
    let row = connection
        .query_row(
            "SELECT id, key, value FROM sync_points WHERE key = ?1",
            params![key],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()
        .map_err(db_err)?;
    match row {
        Some((id, key, value_text)) => Ok(Some(build_record(id, key, &value_text)?)),
        None => Ok(None),
    }
}

fn build_record(id: i64, key: String, value_text: &str) -> Result<SyncPoint, SyncStoreError> {
    let value = serde_json::from_str(value_text).map_err(|err| {
        SyncStoreError::Corrupt(format!("stored value for key {key:?} is not JSON: {err}"))
    })?;
    Ok(SyncPoint { id, key, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Barrier;
    use std::thread;

    fn open_temp_store() -> (SqliteSyncStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            path: dir.path().join("sync.db"),
            busy_timeout_ms: 1_000,
        };
        (SqliteSyncStore::open(&config).unwrap(), dir)
    }

    #[test]
    fn save_then_get_round_trips() {
        let (store, _dir) = open_temp_store();
        let saved = store.save("episodes", &json!({"played": [1, 2]})).unwrap();
        let fetched = store.get("episodes").unwrap().unwrap();
        assert_eq!(saved, fetched);
        assert_eq!(fetched.value, json!({"played": [1, 2]}));
    }

    #[test]
    fn upsert_replaces_value_and_keeps_id() {
        let (store, _dir) = open_temp_store();
        let first = store.save("position", &json!("a")).unwrap();
        let second = store.save("position", &json!("b")).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.value, json!("b"));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn distinct_keys_get_distinct_ids() {
        let (store, _dir) = open_temp_store();
        let a = store.save("k1", &json!("a")).unwrap();
        let b = store.save("k2", &json!("b")).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn get_unknown_key_is_none_not_error() {
        let (store, _dir) = open_temp_store();
        assert!(store.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn delete_removes_row() {
        let (store, _dir) = open_temp_store();
        store.save("gone", &json!(1)).unwrap();
        assert!(store.delete("gone").unwrap());
        assert!(!store.delete("gone").unwrap());
        assert!(store.get("gone").unwrap().is_none());
    }

    #[test]
    fn concurrent_saves_on_one_new_key_yield_one_row() {
        let (store, _dir) = open_temp_store();
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.save("contended", &json!(i)).unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let records = store.list().unwrap();
        assert_eq!(records.len(), 1, "uniqueness invariant violated");
    }

    #[test]
    fn readiness_succeeds_on_open_store() {
        let (store, _dir) = open_temp_store();
        store.readiness().unwrap();
    }

    #[test]
    fn store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            path: dir.path().join("sync.db"),
            busy_timeout_ms: 1_000,
        };
        let id = {
            let store = SqliteSyncStore::open(&config).unwrap();
            store.save("persist", &json!({"x": 1})).unwrap().id
        };
        let store = SqliteSyncStore::open(&config).unwrap();
        let record = store.get("persist").unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.value, json!({"x": 1}));
    }
}
