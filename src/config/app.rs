use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::images::ImageOptions;

pub const CONFIG_FILE_NAME: &str = "lorebook.toml";
pub const DB_FILE_NAME: &str = "lorebook.db";

const DEFAULT_RECORD_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Capacity of the record store, counted as key plus serialized value bytes.
    pub record_quota_bytes: u64,
    /// Anonymous paste host used for `#id=` share links.
    pub paste_host: String,
    /// Origin and path that share links are built on (e.g. "https://wiki.example.com/").
    pub share_base_url: String,
    /// Compressed payloads at or below this length are embedded in the link
    /// instead of uploaded. Zero always uploads.
    pub inline_share_limit: usize,
    pub image: ImageOptions,
}

impl AppConfig {
    /// Loads `<data_dir>/lorebook.toml` if present, otherwise returns defaults
    /// rooted at `data_dir`.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let path = data_dir.join(CONFIG_FILE_NAME);

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str::<Self>(&content)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?
        } else {
            Self::default()
        };

        config.data_dir = data_dir.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(self.data_dir.join(CONFIG_FILE_NAME), content)?;
        Ok(())
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    fn validate(&self) -> Result<()> {
        if self.paste_host.trim().is_empty() {
            return Err(Error::Config("paste_host cannot be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.image.quality) {
            return Err(Error::Config(format!(
                "image.quality must be between 0 and 1, got {}",
                self.image.quality
            )));
        }
        if self.image.max_width == 0 || self.image.max_height == 0 {
            return Err(Error::Config("image bounds must be non-zero".to_string()));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            record_quota_bytes: DEFAULT_RECORD_QUOTA_BYTES,
            paste_host: "https://paste.rs".to_string(),
            share_base_url: "http://localhost:3000/".to_string(),
            inline_share_limit: 0,
            image: ImageOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_without_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load(temp.path()).unwrap();
        assert_eq!(config.data_dir, temp.path());
        assert_eq!(config.record_quota_bytes, DEFAULT_RECORD_QUOTA_BYTES);
        assert_eq!(config.db_path(), temp.path().join(DB_FILE_NAME));
    }

    #[test]
    fn test_load_partial_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "paste_host = \"http://127.0.0.1:9999\"\ninline_share_limit = 4096\n",
        )
        .unwrap();

        let config = AppConfig::load(temp.path()).unwrap();
        assert_eq!(config.paste_host, "http://127.0.0.1:9999");
        assert_eq!(config.inline_share_limit, 4096);
        assert_eq!(config.image.max_width, 1024);
    }

    #[test]
    fn test_invalid_quality_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[image]\nmax_width = 10\nmax_height = 10\nquality = 3.0\n",
        )
        .unwrap();

        assert!(matches!(AppConfig::load(temp.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig {
            data_dir: temp.path().to_path_buf(),
            share_base_url: "https://wiki.example.com/".to_string(),
            ..AppConfig::default()
        };
        config.save().unwrap();

        let loaded = AppConfig::load(temp.path()).unwrap();
        assert_eq!(loaded.share_base_url, "https://wiki.example.com/");
    }
}
