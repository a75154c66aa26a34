use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The record medium's quota is exhausted. Nothing was written.
    #[error("storage capacity exceeded")]
    CapacityExceeded,

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("image encoding failed: {0}")]
    EncodeFailure(String),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("share upload failed: {0}")]
    ShareUploadFailed(String),

    #[error("import failed: {0}")]
    ImportFailed(String),
}

impl Error {
    /// Message suitable for showing to an end user at the action boundary.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::CapacityExceeded => {
                "Storage is full. Remove some images or characters and try again.".to_string()
            }
            Self::UnsupportedFormat(_) => "That file is not a supported image.".to_string(),
            Self::EncodeFailure(_) => "The image could not be processed.".to_string(),
            Self::InvalidSnapshot(_) => {
                "The backup file is not valid. Nothing was imported.".to_string()
            }
            Self::ShareUploadFailed(_) => "Could not create a share link. \
                 Use the export to file option and send the file instead."
                .to_string(),
            Self::ImportFailed(_) => {
                "Import failed. The link may be corrupted, expired, or invalid.".to_string()
            }
            Self::AlreadyExists => "That name is already taken.".to_string(),
            Self::NotFound => "Not found.".to_string(),
            Self::BadRequest(msg) => msg.clone(),
            other => format!("Something went wrong: {other}"),
        }
    }

    /// Whether the failure comes from an external service and offers a fallback path.
    #[must_use]
    pub fn is_share_failure(&self) -> bool {
        matches!(self, Self::ShareUploadFailed(_) | Self::ImportFailed(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
