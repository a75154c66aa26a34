use std::fmt;

use uuid::Uuid;

pub const BLOB_SCHEME: &str = "idb://";
const INLINE_PREFIX: &str = "data:";

/// A non-owning reference to an image. The blob store owns the bytes; a key
/// may dangle after a delete or an import wipe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageKey {
    /// Bytes live in the blob store under the full key string.
    Blob(String),
    /// Self-describing legacy value (a `data:` URI or an external URL).
    Inline(String),
}

impl ImageKey {
    #[must_use]
    pub fn generate() -> Self {
        Self::Blob(format!("{BLOB_SCHEME}{}", Uuid::new_v4()))
    }

    /// Returns `None` for empty or whitespace-only keys.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with(BLOB_SCHEME) {
            if trimmed.len() == BLOB_SCHEME.len() {
                return None;
            }
            Some(Self::Blob(trimmed.to_string()))
        } else {
            Some(Self::Inline(raw.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Blob(s) | Self::Inline(s) => s,
        }
    }

    #[must_use]
    pub fn is_blob(&self) -> bool {
        matches!(self, Self::Blob(_))
    }

    #[must_use]
    pub fn is_data_uri(&self) -> bool {
        matches!(self, Self::Inline(s) if s.starts_with(INLINE_PREFIX))
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ImageKey> for String {
    fn from(key: ImageKey) -> Self {
        match key {
            ImageKey::Blob(s) | ImageKey::Inline(s) => s,
        }
    }
}
