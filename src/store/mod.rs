mod memory;
pub mod portable;
mod schema;
mod sqlite;

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::join_all;
use serde_json::Value;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::RecordKey;

/// Puts per blob-store transaction when writing in bulk.
pub const BULK_WRITE_BATCH: usize = 5;
/// Blobs fetched and encoded concurrently during a bulk export.
pub const EXPORT_BATCH: usize = 50;

/// RecordStore is the synchronous key to JSON map holding all structured state.
pub trait RecordStore: Send + Sync {
    fn get(&self, key: RecordKey) -> Result<Option<Value>>;

    /// Replaces the whole value under `key`. Fails with
    /// [`Error::CapacityExceeded`](crate::error::Error::CapacityExceeded)
    /// without changing anything when the quota would be exceeded.
    fn set(&self, key: RecordKey, value: &Value) -> Result<()>;

    fn remove(&self, key: RecordKey) -> Result<()>;

    /// Bytes currently counted against the quota.
    fn usage_bytes(&self) -> Result<u64>;

    fn quota_bytes(&self) -> u64;

    /// Keys that currently hold a value.
    fn present_keys(&self) -> Result<Vec<RecordKey>> {
        let mut keys = Vec::new();
        for key in RecordKey::ALL {
            if self.get(key)?.is_some() {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProgress {
    pub completed: usize,
    pub total: usize,
}

pub type ProgressFn<'a> = &'a (dyn Fn(ExportProgress) + Send + Sync);

/// BlobStore is the asynchronous key to bytes store that owns image data.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Resolves only after the write is committed.
    async fn put_image(&self, key: &str, bytes: Bytes) -> Result<()>;

    /// Writes every entry in one transaction: all succeed or none do.
    async fn put_batch(&self, entries: Vec<(String, Bytes)>) -> Result<()>;

    async fn get_image(&self, key: &str) -> Result<Option<Bytes>>;

    async fn exists(&self, key: &str) -> Result<bool>;

    async fn keys(&self) -> Result<Vec<String>>;

    async fn clear(&self) -> Result<()>;

    /// Writes `images` in sequential batches of [`BULK_WRITE_BATCH`]. A batch
    /// starts only after the previous one committed.
    async fn put_images_bulk(&self, images: BTreeMap<String, Bytes>) -> Result<usize> {
        let total = images.len();
        let mut pending = images.into_iter().peekable();
        let mut written = 0;

        while pending.peek().is_some() {
            let batch: Vec<(String, Bytes)> = pending.by_ref().take(BULK_WRITE_BATCH).collect();
            let len = batch.len();
            self.put_batch(batch).await?;
            written += len;
            tracing::debug!("bulk write committed {written}/{total} images");
        }

        Ok(written)
    }

    /// Encodes every blob as a `data:` URI. Keys are listed first, then
    /// fetched in concurrent batches of [`EXPORT_BATCH`] with a yield after
    /// each batch. Unreadable blobs are logged and left out.
    async fn list_all_as_portable_encoding(
        &self,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<BTreeMap<String, String>> {
        let keys = self.keys().await?;
        let total = keys.len();
        let mut encoded = BTreeMap::new();
        let mut completed = 0;

        for chunk in keys.chunks(EXPORT_BATCH) {
            let fetches = chunk.iter().map(|key| async move {
                let outcome = self.get_image(key).await;
                (key, outcome)
            });

            for (key, outcome) in join_all(fetches).await {
                match outcome {
                    Ok(Some(bytes)) => {
                        encoded.insert(key.clone(), portable::encode_data_uri(&bytes));
                    }
                    Ok(None) => tracing::warn!("blob {key} vanished during export, skipping"),
                    Err(e) => tracing::warn!("failed to read blob {key} during export: {e}"),
                }
            }

            completed += chunk.len();
            if let Some(report) = progress {
                report(ExportProgress { completed, total });
            }
            tokio::task::yield_now().await;
        }

        Ok(encoded)
    }
}
