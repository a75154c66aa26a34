use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Map;

use super::Snapshot;
use crate::error::Result;
use crate::images::ImageResolver;
use crate::store::portable::decode_data_uri;
use crate::store::{BlobStore, ProgressFn, RecordStore};
use crate::types::RecordKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub include_images: bool,
    /// Whether user accounts and the signed-in pointer are included.
    pub include_identity: bool,
}

impl ExportOptions {
    /// Full backup for file download.
    #[must_use]
    pub fn backup() -> Self {
        Self {
            include_images: true,
            include_identity: true,
        }
    }

    /// World content only, for share links.
    #[must_use]
    pub fn share() -> Self {
        Self {
            include_images: true,
            include_identity: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub records_written: usize,
    pub records_skipped: usize,
    pub images_written: usize,
    pub images_skipped: usize,
}

/// Serializes the record and blob stores into a [`Snapshot`] and back.
#[derive(Clone)]
pub struct SnapshotCodec {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    resolver: Arc<ImageResolver>,
}

impl SnapshotCodec {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        resolver: Arc<ImageResolver>,
    ) -> Self {
        Self {
            records,
            blobs,
            resolver,
        }
    }

    pub async fn export(
        &self,
        options: ExportOptions,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<Snapshot> {
        let mut records = Map::new();
        for key in RecordKey::ALL {
            if key.is_user_identity() && !options.include_identity {
                continue;
            }
            if let Some(value) = self.records.get(key)? {
                records.insert(key.as_str().to_string(), value);
            }
        }

        let images = if options.include_images {
            Some(self.blobs.list_all_as_portable_encoding(progress).await?)
        } else {
            None
        };

        tracing::info!(
            "exported {} records and {} images",
            records.len(),
            images.as_ref().map_or(0, BTreeMap::len)
        );
        Ok(Snapshot { records, images })
    }

    /// Replaces all current state with `snapshot`.
    ///
    /// Existing records and blobs are wiped first. A failure while writing
    /// afterwards leaves the store partially filled; there is no staging area
    /// to roll back to.
    pub async fn import(&self, snapshot: Snapshot) -> Result<ImportSummary> {
        let Snapshot { records, images } = snapshot;

        // Decode before wiping so a bad entry costs only itself.
        let mut summary = ImportSummary::default();
        let mut decoded = BTreeMap::new();
        for (key, encoded) in images.unwrap_or_default() {
            match decode_data_uri(&encoded) {
                Ok(bytes) => {
                    decoded.insert(key, bytes);
                }
                Err(e) => {
                    tracing::warn!("skipping image {key} with malformed encoding: {e}");
                    summary.images_skipped += 1;
                }
            }
        }

        self.wipe().await?;

        for (raw_key, value) in records {
            let Some(key) = RecordKey::parse(&raw_key) else {
                tracing::warn!("skipping unknown record key {raw_key}");
                summary.records_skipped += 1;
                continue;
            };
            self.records.set(key, &value)?;
            summary.records_written += 1;
        }

        summary.images_written = self.put_decoded(decoded).await?;

        tracing::info!(
            "imported {} records ({} skipped) and {} images ({} skipped)",
            summary.records_written,
            summary.records_skipped,
            summary.images_written,
            summary.images_skipped
        );
        Ok(summary)
    }

    async fn wipe(&self) -> Result<()> {
        for key in RecordKey::ALL {
            self.records.remove(key)?;
        }
        self.blobs.clear().await?;
        self.resolver.invalidate();
        Ok(())
    }

    async fn put_decoded(&self, decoded: BTreeMap<String, Bytes>) -> Result<usize> {
        if decoded.is_empty() {
            return Ok(0);
        }
        self.blobs.put_images_bulk(decoded).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::MemoryStore;
    use crate::store::portable::encode_data_uri;
    use serde_json::json;

    fn codec(store: &Arc<MemoryStore>) -> (SnapshotCodec, Arc<ImageResolver>) {
        let resolver = Arc::new(ImageResolver::new(store.clone()));
        (
            SnapshotCodec::new(store.clone(), store.clone(), resolver.clone()),
            resolver,
        )
    }

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        store
            .set(RecordKey::Users, &json!([{"username": "alice", "password": "pw", "role": "admin"}]))
            .unwrap();
        store.set(RecordKey::CurrentUser, &json!("alice")).unwrap();
        store.set(RecordKey::Synopsis, &json!("A story")).unwrap();
        store.set(RecordKey::Logo, &json!("idb://logo")).unwrap();
        store
            .put_image("idb://logo", Bytes::from_static(b"logo-bytes"))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_export_backup_includes_everything() {
        let store = seeded().await;
        let (codec, _) = codec(&store);

        let snapshot = codec.export(ExportOptions::backup(), None).await.unwrap();
        assert_eq!(snapshot.records.len(), 4);
        assert_eq!(snapshot.records["wiki_current_user"], json!("alice"));
        assert_eq!(
            snapshot.images.unwrap()["idb://logo"],
            encode_data_uri(b"logo-bytes")
        );
    }

    #[tokio::test]
    async fn test_export_share_excludes_identity() {
        let store = seeded().await;
        let (codec, _) = codec(&store);

        let snapshot = codec.export(ExportOptions::share(), None).await.unwrap();
        assert!(!snapshot.records.contains_key("wiki_users"));
        assert!(!snapshot.records.contains_key("wiki_current_user"));
        assert!(snapshot.records.contains_key("wiki_synopsis"));
    }

    #[tokio::test]
    async fn test_export_without_images() {
        let store = seeded().await;
        let (codec, _) = codec(&store);

        let options = ExportOptions {
            include_images: false,
            include_identity: true,
        };
        let snapshot = codec.export(options, None).await.unwrap();
        assert_eq!(snapshot.images, None);
    }

    #[tokio::test]
    async fn test_import_replaces_state_and_invalidates_cache() {
        let store = seeded().await;
        let (codec, resolver) = codec(&store);
        assert!(resolver.resolve("idb://logo").await.is_some());

        let snapshot = Snapshot::from_value(json!({
            "localStorage": {"wiki_synopsis": "Another story", "wiki_logo": "idb://new"},
            "indexedDB": {"idb://new": encode_data_uri(b"new-logo")}
        }))
        .unwrap();

        let summary = codec.import(snapshot).await.unwrap();
        assert_eq!(summary.records_written, 2);
        assert_eq!(summary.images_written, 1);

        assert_eq!(store.get(RecordKey::Users).unwrap(), None);
        assert_eq!(store.get(RecordKey::Synopsis).unwrap(), Some(json!("Another story")));
        assert!(!store.exists("idb://logo").await.unwrap());
        assert_eq!(resolver.cached_len(), 0);
        assert!(resolver.resolve("idb://logo").await.is_none());
        assert!(resolver.resolve("idb://new").await.is_some());
    }

    #[tokio::test]
    async fn test_import_skips_malformed_image_only() {
        let store = Arc::new(MemoryStore::default());
        let (codec, _) = codec(&store);

        let snapshot = Snapshot::from_value(json!({
            "localStorage": {"wiki_unknown_key": 1, "wiki_synopsis": "s"},
            "indexedDB": {
                "idb://good": encode_data_uri(b"good"),
                "idb://bad": "data:image/png;base64,@@@@"
            }
        }))
        .unwrap();

        let summary = codec.import(snapshot).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                records_written: 1,
                records_skipped: 1,
                images_written: 1,
                images_skipped: 1,
            }
        );
        assert_eq!(
            store.get_image("idb://good").await.unwrap(),
            Some(Bytes::from_static(b"good"))
        );
        assert!(!store.exists("idb://bad").await.unwrap());
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = seeded().await;
        let (codec, _) = codec(&store);

        let snapshot = codec.export(ExportOptions::backup(), None).await.unwrap();
        let text = snapshot.to_json().unwrap();

        store.set(RecordKey::Synopsis, &json!("edited after export")).unwrap();
        store
            .put_image("idb://extra", Bytes::from_static(b"extra"))
            .await
            .unwrap();

        codec.import(Snapshot::from_json(&text).unwrap()).await.unwrap();

        let again = codec.export(ExportOptions::backup(), None).await.unwrap();
        assert_eq!(again, snapshot);
    }

    #[tokio::test]
    async fn test_import_capacity_failure_surfaces() {
        let store = Arc::new(MemoryStore::new(32));
        let (codec, _) = codec(&store);
        let snapshot = Snapshot::from_value(json!({
            "localStorage": {"wiki_synopsis": "x".repeat(100)}
        }))
        .unwrap();

        assert!(matches!(
            codec.import(snapshot).await,
            Err(Error::CapacityExceeded)
        ));
    }
}
