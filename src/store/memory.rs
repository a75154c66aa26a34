use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use super::{BlobStore, RecordStore};
use crate::error::{Error, Result};
use crate::types::RecordKey;

/// In-memory record and blob store.
///
/// Intended for tests and embedding. Records are kept serialized so the
/// quota is counted the same way as on disk.
pub struct MemoryStore {
    records: RwLock<BTreeMap<RecordKey, String>>,
    blobs: RwLock<BTreeMap<String, Bytes>>,
    quota_bytes: u64,
}

impl MemoryStore {
    #[must_use]
    pub fn new(quota_bytes: u64) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            blobs: RwLock::new(BTreeMap::new()),
            quota_bytes,
        }
    }

    /// Number of blobs currently stored.
    pub fn blob_count(&self) -> usize {
        self.blobs.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(u64::MAX)
    }
}

fn entry_size(key: RecordKey, serialized: &str) -> u64 {
    (key.as_str().len() + serialized.len()) as u64
}

impl RecordStore for MemoryStore {
    fn get(&self, key: RecordKey) -> Result<Option<Value>> {
        let map = self.records.read().unwrap_or_else(|e| e.into_inner());
        map.get(&key)
            .map(|text| serde_json::from_str(text))
            .transpose()
            .map_err(Error::from)
    }

    fn set(&self, key: RecordKey, value: &Value) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        let mut map = self.records.write().unwrap_or_else(|e| e.into_inner());

        let others: u64 = map
            .iter()
            .filter(|(k, _)| **k != key)
            .map(|(k, v)| entry_size(*k, v))
            .sum();
        if others.saturating_add(entry_size(key, &serialized)) > self.quota_bytes {
            return Err(Error::CapacityExceeded);
        }

        map.insert(key, serialized);
        Ok(())
    }

    fn remove(&self, key: RecordKey) -> Result<()> {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&key);
        Ok(())
    }

    fn usage_bytes(&self) -> Result<u64> {
        let map = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(map.iter().map(|(k, v)| entry_size(*k, v)).sum())
    }

    fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn put_image(&self, key: &str, bytes: Bytes) -> Result<()> {
        self.blobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), bytes);
        Ok(())
    }

    async fn put_batch(&self, entries: Vec<(String, Bytes)>) -> Result<()> {
        let mut map = self.blobs.write().unwrap_or_else(|e| e.into_inner());
        map.extend(entries);
        Ok(())
    }

    async fn get_image(&self, key: &str) -> Result<Option<Bytes>> {
        let map = self.blobs.read().unwrap_or_else(|e| e.into_inner());
        Ok(map.get(key).cloned())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let map = self.blobs.read().unwrap_or_else(|e| e.into_inner());
        Ok(map.contains_key(key))
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let map = self.blobs.read().unwrap_or_else(|e| e.into_inner());
        Ok(map.keys().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.blobs.write().unwrap_or_else(|e| e.into_inner()).clear();
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner()).len();
        f.debug_struct("MemoryStore")
            .field("records", &records)
            .field("blobs", &self.blob_count())
            .field("quota_bytes", &self.quota_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ExportProgress;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_capacity_rollback() {
        let store = MemoryStore::new(40);
        store.set(RecordKey::Logo, &json!("idb://a")).unwrap();

        let result = store.set(RecordKey::Synopsis, &json!("far too long for the quota"));
        assert!(matches!(result, Err(Error::CapacityExceeded)));
        assert_eq!(store.get(RecordKey::Synopsis).unwrap(), None);
        assert_eq!(store.get(RecordKey::Logo).unwrap(), Some(json!("idb://a")));
    }

    #[test]
    fn test_present_keys_in_key_order() {
        let store = MemoryStore::default();
        store.set(RecordKey::Synopsis, &json!("s")).unwrap();
        store.set(RecordKey::Users, &json!([])).unwrap();
        assert_eq!(
            store.present_keys().unwrap(),
            vec![RecordKey::Users, RecordKey::Synopsis]
        );
    }

    #[tokio::test]
    async fn test_portable_export_reports_progress() {
        let store = MemoryStore::default();
        let images = (0..120)
            .map(|i| (format!("idb://{i:03}"), Bytes::from(format!("img-{i}"))))
            .collect();
        store.put_images_bulk(images).await.unwrap();

        let seen = Mutex::new(Vec::new());
        let report = |p: ExportProgress| seen.lock().unwrap().push(p);
        let encoded = store
            .list_all_as_portable_encoding(Some(&report))
            .await
            .unwrap();

        assert_eq!(encoded.len(), 120);
        let seen = seen.into_inner().unwrap();
        let completed: Vec<usize> = seen.iter().map(|p| p.completed).collect();
        assert_eq!(completed, vec![50, 100, 120]);
        assert!(seen.iter().all(|p| p.total == 120));
    }

    #[tokio::test]
    async fn test_portable_export_empty_store() {
        let store = MemoryStore::default();
        let encoded = store.list_all_as_portable_encoding(None).await.unwrap();
        assert!(encoded.is_empty());
    }
}
