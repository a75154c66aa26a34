use std::sync::Arc;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::BlobStore;
use crate::types::ImageKey;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// Lossy encode quality in `0.0..=1.0`.
    pub quality: f32,
}

impl ImageOptions {
    #[must_use]
    pub fn avatar() -> Self {
        Self {
            max_width: 256,
            max_height: 256,
            quality: 0.85,
        }
    }

    /// Bounds must be non-zero.
    pub fn validate(self) -> Result<()> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(Error::BadRequest(format!(
                "image bounds must be non-zero, got {}x{}",
                self.max_width, self.max_height
            )));
        }
        Ok(())
    }

    fn jpeg_quality(self) -> u8 {
        (self.quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_width: 1024,
            max_height: 1024,
            quality: 0.85,
        }
    }
}

/// Formats whose pixels must survive untouched when no resize is needed.
fn requires_exact_pixels(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Png | ImageFormat::Gif)
}

fn supports_transparency(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP
    )
}

/// Target size that fits within the bounds, scaled by whichever side
/// overshoots more. `None` when the image already fits.
fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> Option<(u32, u32)> {
    if width <= max_width && height <= max_height {
        return None;
    }
    let ratio = f64::max(
        f64::from(width) / f64::from(max_width),
        f64::from(height) / f64::from(max_height),
    );
    let scaled_w = (f64::from(width) / ratio).round().clamp(1.0, f64::from(max_width)) as u32;
    let scaled_h = (f64::from(height) / ratio).round().clamp(1.0, f64::from(max_height)) as u32;
    Some((scaled_w, scaled_h))
}

/// Decodes, bounds, and re-encodes `input`. Returns the bytes to persist.
pub(crate) fn prepare(input: &[u8], options: ImageOptions) -> Result<Bytes> {
    options.validate()?;
    let format = image::guess_format(input)
        .map_err(|e| Error::UnsupportedFormat(e.to_string()))?;
    let decoded = image::load_from_memory_with_format(input, format)
        .map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    let (width, height) = decoded.dimensions();
    let target = fit_within(width, height, options.max_width, options.max_height);

    if target.is_none() && requires_exact_pixels(format) {
        tracing::debug!("keeping original {format:?} image ({width}x{height})");
        return Ok(Bytes::copy_from_slice(input));
    }

    let resized = match target {
        Some((w, h)) => {
            tracing::debug!("resizing {width}x{height} image to {w}x{h}");
            decoded.resize_exact(w, h, FilterType::Lanczos3)
        }
        None => decoded,
    };

    let mut out = Vec::new();
    if supports_transparency(format) {
        resized
            .write_with_encoder(PngEncoder::new(&mut out))
            .map_err(|e| Error::EncodeFailure(e.to_string()))?;
    } else {
        DynamicImage::ImageRgb8(resized.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(
                &mut out,
                options.jpeg_quality(),
            ))
            .map_err(|e| Error::EncodeFailure(e.to_string()))?;
    }

    if out.is_empty() {
        return Err(Error::EncodeFailure("encoder produced no output".to_string()));
    }
    Ok(Bytes::from(out))
}

/// Turns uploaded files into stored images addressed by fresh keys.
#[derive(Clone)]
pub struct ImagePipeline {
    blobs: Arc<dyn BlobStore>,
}

impl ImagePipeline {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    pub async fn store(&self, file: Bytes, options: ImageOptions) -> Result<ImageKey> {
        let prepared = tokio::task::spawn_blocking(move || prepare(&file, options))
            .await
            .map_err(|e| Error::EncodeFailure(format!("image worker failed: {e}")))??;

        let key = ImageKey::generate();
        self.blobs.put_image(key.as_str(), prepared).await?;
        tracing::info!("stored image {key}");
        Ok(key)
    }
}
