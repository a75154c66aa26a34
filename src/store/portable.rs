//! Portable text encoding of blob bytes used by snapshots.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use image::ImageFormat;

use crate::error::{Error, Result};

const OCTET_STREAM: &str = "application/octet-stream";

#[must_use]
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Bmp) => "image/bmp",
        _ => OCTET_STREAM,
    }
}

#[must_use]
pub fn encode_data_uri(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", sniff_mime(bytes), STANDARD.encode(bytes))
}

/// Decodes a `data:<mime>;base64,<payload>` string back to bytes.
pub fn decode_data_uri(uri: &str) -> Result<Bytes> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::BadRequest("not a data URI".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::BadRequest("data URI has no payload".to_string()))?;

    if !header.ends_with(";base64") {
        return Err(Error::BadRequest(
            "only base64 data URIs are supported".to_string(),
        ));
    }

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(payload.as_bytes())
        .map(Bytes::from)
        .map_err(|e| Error::BadRequest(format!("invalid base64 in data URI: {e}")))
}
