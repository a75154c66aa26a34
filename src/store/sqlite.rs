use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use serde_json::Value;

use super::schema::SCHEMA;
use super::{BlobStore, RecordStore};
use crate::error::{Error, Result};
use crate::types::RecordKey;

/// SQLite-backed record and blob store sharing one database file.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    quota_bytes: u64,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P, quota_bytes: u64) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "FULL")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            quota_bytes,
        })
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(|e| e.into_inner());
            f(&mut guard)
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(format!("blob worker failed: {e}"))))?
    }

    /// Number of blobs and their total size in bytes.
    pub fn blob_stats(&self) -> Result<(i64, i64)> {
        self.conn()
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(size), 0) FROM blobs",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(Error::from)
    }
}

fn is_disk_full(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::DiskFull)
}

fn map_write_error(e: rusqlite::Error) -> Error {
    if is_disk_full(&e) {
        Error::CapacityExceeded
    } else {
        Error::Database(e)
    }
}

fn record_size(key: RecordKey, serialized: &str) -> u64 {
    (key.as_str().len() + serialized.len()) as u64
}

impl RecordStore for SqliteStore {
    fn get(&self, key: RecordKey) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM records WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(text) => match serde_json::from_str(&text) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    // Values written by older builds may be bare strings.
                    tracing::debug!("record {key} is not JSON ({e}), reading as string");
                    Ok(Some(Value::String(text)))
                }
            },
            None => Ok(None),
        }
    }

    fn set(&self, key: RecordKey, value: &Value) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        let incoming = record_size(key, &serialized);

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let others: i64 = tx.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
             FROM records WHERE key != ?1",
            params![key.as_str()],
            |row| row.get(0),
        )?;

        if others.max(0) as u64 + incoming > self.quota_bytes {
            tracing::warn!(
                "record {key} needs {incoming} bytes, {} of {} already used",
                others,
                self.quota_bytes
            );
            return Err(Error::CapacityExceeded);
        }

        tx.execute(
            "INSERT INTO records (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key.as_str(), serialized],
        )
        .map_err(map_write_error)?;
        tx.commit().map_err(map_write_error)?;
        Ok(())
    }

    fn remove(&self, key: RecordKey) -> Result<()> {
        self.conn()
            .execute("DELETE FROM records WHERE key = ?1", params![key.as_str()])?;
        Ok(())
    }

    fn usage_bytes(&self) -> Result<u64> {
        let used: i64 = self.conn().query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
             FROM records",
            [],
            |row| row.get(0),
        )?;
        Ok(used.max(0) as u64)
    }

    fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }

    fn present_keys(&self) -> Result<Vec<RecordKey>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key FROM records")?;
        let stored = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(RecordKey::ALL
            .into_iter()
            .filter(|k| stored.iter().any(|s| s == k.as_str()))
            .collect())
    }
}

const UPSERT_BLOB: &str = "INSERT INTO blobs (key, data, size) VALUES (?1, ?2, ?3)
     ON CONFLICT(key) DO UPDATE SET data = excluded.data, size = excluded.size";

#[async_trait]
impl BlobStore for SqliteStore {
    async fn put_image(&self, key: &str, bytes: Bytes) -> Result<()> {
        let key = key.to_owned();
        self.with_conn(move |conn| {
            conn.execute(UPSERT_BLOB, params![key, bytes.as_ref(), bytes.len() as i64])
                .map_err(map_write_error)?;
            Ok(())
        })
        .await
    }

    async fn put_batch(&self, entries: Vec<(String, Bytes)>) -> Result<()> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(UPSERT_BLOB)?;
                for (key, bytes) in &entries {
                    stmt.execute(params![key, bytes.as_ref(), bytes.len() as i64])
                        .map_err(map_write_error)?;
                }
            }
            tx.commit().map_err(map_write_error)?;
            Ok(())
        })
        .await
    }

    async fn get_image(&self, key: &str) -> Result<Option<Bytes>> {
        let key = key.to_owned();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT data FROM blobs WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
            .map(|data| data.map(Bytes::from))
            .map_err(Error::from)
        })
        .await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let key = key.to_owned();
        self.with_conn(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM blobs WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM blobs ORDER BY key")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(Error::from)
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM blobs", [])?;
            Ok(())
        })
        .await
    }
}
