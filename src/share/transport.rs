use std::sync::Arc;

use super::encoding::{compress, decode_inline, decompress, encode_inline};
use super::fragment::{ShareFragment, strip_fragment};
use super::paste::PasteHost;
use crate::error::{Error, Result};
use crate::snapshot::{ExportOptions, ImportSummary, Snapshot, SnapshotCodec};
use crate::store::ProgressFn;

/// Result of handling an incoming URL.
#[derive(Debug)]
pub struct ConsumedLink {
    /// The URL with any share fragment removed.
    pub clean_url: String,
    /// `None` when the URL carried no share fragment.
    pub outcome: Option<Result<ImportSummary>>,
}

/// Turns world content into share links and share links back into state.
pub struct ShareTransport {
    codec: SnapshotCodec,
    paste: Arc<dyn PasteHost>,
    base_url: String,
    inline_limit: usize,
}

impl ShareTransport {
    pub fn new(codec: SnapshotCodec, paste: Arc<dyn PasteHost>, base_url: &str) -> Self {
        Self {
            codec,
            paste,
            base_url: base_url.to_string(),
            inline_limit: 0,
        }
    }

    /// Compressed payloads up to `limit` characters are embedded as `#cdata=`
    /// instead of uploaded.
    #[must_use]
    pub fn with_inline_limit(mut self, limit: usize) -> Self {
        self.inline_limit = limit;
        self
    }

    async fn share_json(&self, progress: Option<ProgressFn<'_>>) -> Result<String> {
        let snapshot = self.codec.export(ExportOptions::share(), progress).await?;
        snapshot.to_json()
    }

    /// Builds the current link: compressed, then embedded when small enough
    /// or uploaded to the paste host and referenced by id.
    pub async fn share_link(&self, progress: Option<ProgressFn<'_>>) -> Result<String> {
        let json = self.share_json(progress).await?;
        let payload = compress(&json)?;

        if self.inline_limit > 0 && payload.len() <= self.inline_limit {
            tracing::info!("embedding {} byte payload in share link", payload.len());
            return Ok(ShareFragment::Compressed(payload).to_url(&self.base_url));
        }

        let id = self.paste.upload(payload).await?;
        Ok(ShareFragment::PasteId(id).to_url(&self.base_url))
    }

    /// Always embeds the compressed payload, however large.
    pub async fn compressed_link(&self, progress: Option<ProgressFn<'_>>) -> Result<String> {
        let json = self.share_json(progress).await?;
        Ok(ShareFragment::Compressed(compress(&json)?).to_url(&self.base_url))
    }

    /// Uncompressed base64 link, readable by older builds.
    pub async fn legacy_link(&self, progress: Option<ProgressFn<'_>>) -> Result<String> {
        let json = self.share_json(progress).await?;
        Ok(ShareFragment::Legacy(encode_inline(&json)).to_url(&self.base_url))
    }

    /// Recovers the snapshot a fragment points at and imports it. Anything
    /// wrong with the link itself surfaces as [`Error::ImportFailed`] before
    /// current state is touched.
    pub async fn receive(&self, fragment: &ShareFragment) -> Result<ImportSummary> {
        let json = match fragment {
            ShareFragment::PasteId(id) => {
                tracing::info!("fetching shared payload {id}");
                decompress(&self.paste.fetch(id).await?)?
            }
            ShareFragment::Compressed(payload) => decompress(payload)?,
            ShareFragment::Legacy(payload) => decode_inline(payload)?,
        };

        let snapshot = Snapshot::from_json(&json).map_err(|e| match e {
            Error::InvalidSnapshot(msg) => Error::ImportFailed(msg),
            other => other,
        })?;
        self.codec.import(snapshot).await
    }

    /// Handles a URL on arrival. The returned `clean_url` should replace the
    /// current location whether or not the import succeeded.
    pub async fn consume_url(&self, url: &str) -> ConsumedLink {
        let Some(fragment) = ShareFragment::parse(url) else {
            return ConsumedLink {
                clean_url: url.to_string(),
                outcome: None,
            };
        };

        let outcome = self.receive(&fragment).await;
        if let Err(e) = &outcome {
            tracing::warn!("share link import failed: {e}");
        }
        ConsumedLink {
            clean_url: strip_fragment(url).to_string(),
            outcome: Some(outcome),
        }
    }
}
