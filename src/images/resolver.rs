use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use uuid::Uuid;

use crate::store::BlobStore;
use crate::store::portable::sniff_mime;
use crate::types::ImageKey;

/// A blob loaded for display, addressable by a session-scoped URL.
#[derive(Debug)]
pub struct BlobImage {
    pub key: String,
    pub url: String,
    pub mime: &'static str,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Legacy keys are already displayable and are returned as stored.
    Inline(String),
    Blob(Arc<BlobImage>),
}

impl ImageSource {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Inline(s) => s,
            Self::Blob(blob) => &blob.url,
        }
    }
}

/// Resolves image keys to displayable sources, caching blob lookups for the
/// life of the session. The cache must be invalidated whenever the blob
/// store is wiped, since keys can then point at different bytes.
pub struct ImageResolver {
    blobs: Arc<dyn BlobStore>,
    cache: Mutex<HashMap<String, Arc<BlobImage>>>,
}

impl ImageResolver {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<BlobImage>>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns `None` for empty keys and for keys whose blob is gone.
    pub async fn resolve(&self, raw_key: &str) -> Option<ImageSource> {
        let key = match ImageKey::parse(raw_key)? {
            ImageKey::Inline(value) => return Some(ImageSource::Inline(value)),
            ImageKey::Blob(key) => key,
        };

        if let Some(hit) = self.cache().get(&key) {
            return Some(ImageSource::Blob(hit.clone()));
        }

        let bytes = match self.blobs.get_image(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!("image {key} has no blob, treating as missing");
                return None;
            }
            Err(e) => {
                tracing::warn!("failed to load image {key}: {e}");
                return None;
            }
        };

        let loaded = Arc::new(BlobImage {
            url: format!("blob:lorebook/{}", Uuid::new_v4()),
            mime: sniff_mime(&bytes),
            key: key.clone(),
            bytes,
        });

        // A concurrent resolve may have won the race; keep the first entry.
        let entry = self.cache().entry(key).or_insert(loaded).clone();
        Some(ImageSource::Blob(entry))
    }

    /// Drops every cached reference.
    pub fn invalidate(&self) {
        let mut cache = self.cache();
        if !cache.is_empty() {
            tracing::debug!("dropping {} cached image references", cache.len());
        }
        cache.clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_empty_and_orphaned_keys_resolve_to_none() {
        let resolver = ImageResolver::new(Arc::new(MemoryStore::default()));
        assert!(resolver.resolve("").await.is_none());
        assert!(resolver.resolve("idb://missing").await.is_none());
        assert_eq!(resolver.cached_len(), 0);
    }

    #[tokio::test]
    async fn test_inline_key_returned_verbatim() {
        let resolver = ImageResolver::new(Arc::new(MemoryStore::default()));
        let source = resolver
            .resolve("data:image/png;base64,iVBORw0KGgo=")
            .await
            .unwrap();
        assert_eq!(source.url(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[tokio::test]
    async fn test_blob_resolution_is_cached() {
        let blobs = Arc::new(MemoryStore::default());
        blobs
            .put_image("idb://a", Bytes::from_static(b"pixels"))
            .await
            .unwrap();
        let resolver = ImageResolver::new(blobs);

        let first = resolver.resolve("idb://a").await.unwrap();
        let second = resolver.resolve("idb://a").await.unwrap();
        assert_eq!(first.url(), second.url());
        assert!(first.url().starts_with("blob:lorebook/"));
        assert_eq!(resolver.cached_len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_picks_up_new_bytes() {
        let blobs = Arc::new(MemoryStore::default());
        blobs
            .put_image("idb://a", Bytes::from_static(b"old"))
            .await
            .unwrap();
        let resolver = ImageResolver::new(blobs.clone());
        let before = resolver.resolve("idb://a").await.unwrap();

        blobs.clear().await.unwrap();
        blobs
            .put_image("idb://a", Bytes::from_static(b"new"))
            .await
            .unwrap();
        resolver.invalidate();

        let ImageSource::Blob(after) = resolver.resolve("idb://a").await.unwrap() else {
            panic!("expected blob source");
        };
        assert_eq!(after.bytes, Bytes::from_static(b"new"));
        assert_ne!(after.url, before.url());
    }
}
