use bytes::Bytes;

use super::Wiki;
use crate::error::Result;
use crate::images::{ImageOptions, ImageSource};
use crate::types::{ImageKey, RecordKey};

impl Wiki {
    fn text_setting(&self, key: RecordKey) -> Result<Option<String>> {
        Ok(self
            .read::<Option<String>>(key)?
            .flatten()
            .filter(|s| !s.is_empty()))
    }

    /// `None` or an empty value clears the setting.
    fn set_text_setting(&self, key: RecordKey, value: Option<&str>) -> Result<()> {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.write(key, v),
            None => self.records.remove(key),
        }
    }

    pub fn logo(&self) -> Result<Option<String>> {
        self.text_setting(RecordKey::Logo)
    }

    pub fn set_logo(&self, image_key: Option<&str>) -> Result<()> {
        self.set_text_setting(RecordKey::Logo, image_key)
    }

    pub fn auth_banner(&self) -> Result<Option<String>> {
        self.text_setting(RecordKey::AuthBanner)
    }

    pub fn set_auth_banner(&self, image_key: Option<&str>) -> Result<()> {
        self.set_text_setting(RecordKey::AuthBanner, image_key)
    }

    pub fn synopsis(&self) -> Result<Option<String>> {
        self.text_setting(RecordKey::Synopsis)
    }

    pub fn set_synopsis(&self, text: Option<&str>) -> Result<()> {
        self.set_text_setting(RecordKey::Synopsis, text)
    }

    pub fn synopsis_banner(&self) -> Result<Option<String>> {
        self.text_setting(RecordKey::SynopsisBanner)
    }

    pub fn set_synopsis_banner(&self, image_key: Option<&str>) -> Result<()> {
        self.set_text_setting(RecordKey::SynopsisBanner, image_key)
    }

    pub fn home_background(&self) -> Result<Option<String>> {
        self.text_setting(RecordKey::HomeBackground)
    }

    pub fn set_home_background(&self, image_key: Option<&str>) -> Result<()> {
        self.set_text_setting(RecordKey::HomeBackground, image_key)
    }

    pub fn characters_background(&self) -> Result<Option<String>> {
        self.text_setting(RecordKey::CharactersBackground)
    }

    pub fn set_characters_background(&self, image_key: Option<&str>) -> Result<()> {
        self.set_text_setting(RecordKey::CharactersBackground, image_key)
    }

    /// Stores an uploaded file through the image pipeline. `None` uses the
    /// configured defaults.
    pub async fn upload_image(&self, file: Bytes, options: Option<ImageOptions>) -> Result<ImageKey> {
        self.images
            .store(file, options.unwrap_or(self.image_options))
            .await
    }

    pub async fn resolve_image(&self, image_key: &str) -> Option<ImageSource> {
        self.resolver.resolve(image_key).await
    }
}
