//! Named accessors over the stores.
//!
//! [`Wiki`] is the surface the UI and the CLI talk to. Raw record keys do not
//! escape it: every read goes through a typed helper, every write replaces
//! the whole value under its key, and a rejected write leaves the store as it
//! was.

mod characters;
mod settings;
mod users;

pub use characters::{RelationshipTarget, arc_facets};

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::AppConfig;
use crate::error::Result;
use crate::images::{ImageOptions, ImagePipeline, ImageResolver};
use crate::share::{HttpPasteHost, PasteHost, ShareTransport};
use crate::snapshot::SnapshotCodec;
use crate::store::{BlobStore, RecordStore, SqliteStore};
use crate::types::RecordKey;

pub struct Wiki {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    resolver: Arc<ImageResolver>,
    images: ImagePipeline,
    image_options: ImageOptions,
}

impl Wiki {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            resolver: Arc::new(ImageResolver::new(blobs.clone())),
            images: ImagePipeline::new(blobs.clone()),
            image_options: ImageOptions::default(),
            records,
            blobs,
        }
    }

    #[must_use]
    pub fn with_image_options(mut self, options: ImageOptions) -> Self {
        self.image_options = options;
        self
    }

    /// Opens (and creates if needed) the SQLite store under the configured data directory.
    pub fn open(config: &AppConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let store = Arc::new(SqliteStore::new(config.db_path(), config.record_quota_bytes)?);
        store.initialize()?;
        tracing::debug!("opened store at {}", config.db_path().display());
        Ok(Self::new(store.clone(), store).with_image_options(config.image))
    }

    pub fn records(&self) -> &dyn RecordStore {
        self.records.as_ref()
    }

    pub fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    pub fn resolver(&self) -> &ImageResolver {
        &self.resolver
    }

    #[must_use]
    pub fn snapshot_codec(&self) -> SnapshotCodec {
        SnapshotCodec::new(
            self.records.clone(),
            self.blobs.clone(),
            self.resolver.clone(),
        )
    }

    #[must_use]
    pub fn share_transport(&self, paste: Arc<dyn PasteHost>, base_url: &str) -> ShareTransport {
        ShareTransport::new(self.snapshot_codec(), paste, base_url)
    }

    /// Share transport wired to the configured paste host and link base.
    pub fn configured_share_transport(&self, config: &AppConfig) -> Result<ShareTransport> {
        let paste = Arc::new(HttpPasteHost::new(&config.paste_host)?);
        Ok(self
            .share_transport(paste, &config.share_base_url)
            .with_inline_limit(config.inline_share_limit))
    }

    fn read<T: DeserializeOwned>(&self, key: RecordKey) -> Result<Option<T>> {
        match self.records.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: RecordKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.records.set(key, &value)
    }
}
