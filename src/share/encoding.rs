//! Fragment payload encodings.
//!
//! The legacy `#data=` payload is plain base64 over UTF-8 JSON and may have
//! been percent-encoded on top; its decoder percent-decodes first. The
//! compressed payload is gzip then unpadded base64url and is decoded without
//! any percent-decoding step.

use std::io::{Read, Write};

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::{Error, Result};

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

#[must_use]
pub fn encode_inline(json: &str) -> String {
    STANDARD.encode(json.as_bytes())
}

pub fn decode_inline(payload: &str) -> Result<String> {
    let unescaped = urlencoding::decode(payload)
        .map_err(|e| Error::ImportFailed(format!("payload is not valid percent-encoding: {e}")))?;
    let bytes = STANDARD_LENIENT
        .decode(unescaped.trim().as_bytes())
        .map_err(|e| Error::ImportFailed(format!("payload is not valid base64: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::ImportFailed(format!("payload is not valid UTF-8: {e}")))
}

pub fn compress(json: &str) -> Result<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(json.as_bytes())?;
    let gzipped = encoder.finish()?;
    Ok(URL_SAFE_NO_PAD.encode(gzipped))
}

/// Accepts either base64 alphabet, with or without padding.
pub fn decompress(payload: &str) -> Result<String> {
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let engine = if cleaned.contains(['+', '/']) {
        &STANDARD_LENIENT
    } else {
        &URL_SAFE_LENIENT
    };
    let gzipped = engine
        .decode(cleaned.as_bytes())
        .map_err(|e| Error::ImportFailed(format!("payload is not valid base64: {e}")))?;

    let mut json = String::new();
    GzDecoder::new(gzipped.as_slice())
        .read_to_string(&mut json)
        .map_err(|e| Error::ImportFailed(format!("payload could not be decompressed: {e}")))?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"localStorage":{"wiki_synopsis":"Ærith — 龍の物語 🐉"}}"#;

    #[test]
    fn test_inline_handles_non_ascii() {
        let encoded = encode_inline(SAMPLE);
        assert_eq!(decode_inline(&encoded).unwrap(), SAMPLE);
    }

    #[test]
    fn test_inline_accepts_percent_encoded_payload() {
        let encoded = encode_inline(SAMPLE);
        let escaped = urlencoding::encode(&encoded).into_owned();
        assert_ne!(escaped, encoded);
        assert_eq!(decode_inline(&escaped).unwrap(), SAMPLE);
    }

    #[test]
    fn test_compressed_is_url_safe() {
        let encoded = compress(&SAMPLE.repeat(20)).unwrap();
        assert!(
            encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert!(encoded.len() < SAMPLE.len() * 20);
        assert_eq!(decompress(&encoded).unwrap(), SAMPLE.repeat(20));
    }

    #[test]
    fn test_decompress_accepts_standard_alphabet() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        let standard = STANDARD.encode(encoder.finish().unwrap());
        assert_eq!(decompress(&standard).unwrap(), SAMPLE);
    }

    #[test]
    fn test_corrupt_payloads_fail_as_import_errors() {
        assert!(matches!(decompress("%%%"), Err(Error::ImportFailed(_))));
        assert!(matches!(
            decompress(&URL_SAFE_NO_PAD.encode(b"not gzip")),
            Err(Error::ImportFailed(_))
        ));
        assert!(matches!(decode_inline("@@"), Err(Error::ImportFailed(_))));
        assert!(matches!(
            decode_inline(&STANDARD.encode([0xff, 0xfe])),
            Err(Error::ImportFailed(_))
        ));
    }
}
