use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Character categories. `MainAntagonist` is deprecated and folded into
/// `Enemies` on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Main Protagonist")]
    MainProtagonist,
    #[serde(rename = "Allies")]
    Allies,
    #[serde(rename = "Main Antagonist")]
    MainAntagonist,
    #[serde(rename = "Enemies")]
    Enemies,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Self::MainProtagonist,
        Self::Allies,
        Self::MainAntagonist,
        Self::Enemies,
    ];

    /// Categories shown to users; the deprecated one is excluded.
    pub const ACTIVE: [Category; 3] = [Self::MainProtagonist, Self::Allies, Self::Enemies];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::MainProtagonist => "Main Protagonist",
            Self::Allies => "Allies",
            Self::MainAntagonist => "Main Antagonist",
            Self::Enemies => "Enemies",
        }
    }

    #[must_use]
    pub fn is_deprecated(self) -> bool {
        self == Self::MainAntagonist
    }

    /// Where records of a deprecated category end up.
    #[must_use]
    pub fn replacement(self) -> Option<Category> {
        match self {
            Self::MainAntagonist => Some(Self::Enemies),
            _ => None,
        }
    }

    #[must_use]
    pub fn record_key(self) -> RecordKey {
        RecordKey::Characters(self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace(['_', '-'], " ").to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.label().to_lowercase() == normalized)
            .ok_or_else(|| Error::BadRequest(format!("unknown category: {s}")))
    }
}

/// The fixed key space of the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    Users,
    CurrentUser,
    Logo,
    AuthBanner,
    Synopsis,
    SynopsisBanner,
    HomeBackground,
    CharactersBackground,
    Characters(Category),
}

impl RecordKey {
    pub const ALL: [RecordKey; 12] = [
        Self::Users,
        Self::CurrentUser,
        Self::Logo,
        Self::AuthBanner,
        Self::Synopsis,
        Self::SynopsisBanner,
        Self::HomeBackground,
        Self::CharactersBackground,
        Self::Characters(Category::MainProtagonist),
        Self::Characters(Category::Allies),
        Self::Characters(Category::MainAntagonist),
        Self::Characters(Category::Enemies),
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "wiki_users",
            Self::CurrentUser => "wiki_current_user",
            Self::Logo => "wiki_logo",
            Self::AuthBanner => "wiki_auth_banner",
            Self::Synopsis => "wiki_synopsis",
            Self::SynopsisBanner => "wiki_synopsis_banner",
            Self::HomeBackground => "wiki_home_bg",
            Self::CharactersBackground => "wiki_characters_bg",
            Self::Characters(Category::MainProtagonist) => "wiki_characters_Main_Protagonist",
            Self::Characters(Category::Allies) => "wiki_characters_Allies",
            Self::Characters(Category::MainAntagonist) => "wiki_characters_Main_Antagonist",
            Self::Characters(Category::Enemies) => "wiki_characters_Enemies",
        }
    }

    /// User identity keys never leave the device through share links.
    #[must_use]
    pub fn is_user_identity(self) -> bool {
        matches!(self, Self::Users | Self::CurrentUser)
    }

    #[must_use]
    pub fn world_content() -> impl Iterator<Item = RecordKey> {
        Self::ALL.into_iter().filter(|k| !k.is_user_identity())
    }

    #[must_use]
    pub fn parse(key: &str) -> Option<RecordKey> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
