use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const DEFAULT_PORTRAIT_NAME: &str = "Default Portrait";
pub const DEFAULT_OUTFIT_NAME: &str = "Default";

/// Record identifier. Older data used millisecond timestamps, newer data
/// uses strings; both are kept exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(serde_json::Number),
    Text(String),
}

impl EntityId {
    #[must_use]
    pub fn generate() -> Self {
        Self::Text(Uuid::new_v4().to_string())
    }

    /// Stable id derived from a parent, used for records synthesized during migration.
    #[must_use]
    pub fn derived(parent: &EntityId, suffix: &str) -> Self {
        Self::Text(format!("{parent}-{suffix}"))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Accepts a string, a number, or null. Some older records stored ages and
/// heights as numbers.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string, got {other}"
        ))),
    }
}

/// Accepts an integer, a float (rounded), a numeric string, or null (zero).
/// Stat editors in older builds saved raw input text.
fn lenient_stat<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let invalid = |v: &dyn fmt::Display| -> D::Error {
        serde::de::Error::custom(format!("expected a stat value, got {v}"))
    };
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .ok_or_else(|| invalid(&n)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(0);
            }
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.round() as i64)
                })
                .ok_or_else(|| invalid(&s))
        }
        other => Err(invalid(&other)),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    #[serde(deserialize_with = "lenient_stat")]
    pub strength: i64,
    #[serde(deserialize_with = "lenient_stat")]
    pub intelligence: i64,
    #[serde(deserialize_with = "lenient_stat")]
    pub speed: i64,
    #[serde(deserialize_with = "lenient_stat")]
    pub durability: i64,
    #[serde(deserialize_with = "lenient_stat")]
    pub power: i64,
    #[serde(deserialize_with = "lenient_stat")]
    pub combat: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outfit {
    pub id: EntityId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub arc_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Outfit {
    #[must_use]
    pub fn new(id: EntityId, arc_name: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            id,
            arc_name: arc_name.into(),
            image_url,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portrait {
    pub id: EntityId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub outfits: Vec<Outfit>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Portrait {
    #[must_use]
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        image_url: Option<String>,
        outfits: Vec<Outfit>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            image_url,
            outfits,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipLink {
    pub id: EntityId,
    /// `None` when the target is not a managed character.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<EntityId>,
    #[serde(default)]
    pub target_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: EntityId,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Current shape of a character record. Fields this type does not know are
/// carried in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: EntityId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub origin: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appearance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub powers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trivia: Option<String>,
    /// Free-text relationships from before structured links existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<String>,

    pub portraits: Vec<Portrait>,
    #[serde(default)]
    pub gallery: Vec<GalleryImage>,
    pub relationship_links: Vec<RelationshipLink>,
    pub arcs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Character {
    /// A fresh character with one default portrait and outfit.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let id = EntityId::generate();
        let portraits = vec![default_portrait(&id, None, None)];
        Self {
            id,
            name: name.into(),
            alias: None,
            status: None,
            age: None,
            gender: None,
            height: None,
            occupation: None,
            origin: None,
            biography: None,
            personality: None,
            appearance: None,
            powers: None,
            trivia: None,
            relationships: None,
            portraits,
            gallery: Vec::new(),
            relationship_links: Vec::new(),
            arcs: Vec::new(),
            background_image_url: None,
            stats: Some(Stats::default()),
            extra: Map::new(),
        }
    }

    /// Every image key this record references, in document order.
    #[must_use]
    pub fn image_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        for portrait in &self.portraits {
            keys.extend(portrait.image_url.as_deref());
            for outfit in &portrait.outfits {
                keys.extend(outfit.image_url.as_deref());
            }
        }
        keys.extend(self.gallery.iter().map(|g| g.image_url.as_str()));
        keys.extend(self.background_image_url.as_deref());
        keys.retain(|k| !k.is_empty());
        keys
    }

    #[must_use]
    pub fn satisfies_portrait_invariant(&self) -> bool {
        !self.portraits.is_empty() && self.portraits.iter().all(|p| !p.outfits.is_empty())
    }
}

/// "Default Portrait" holding either the given outfits or a single "Default" outfit.
#[must_use]
pub fn default_portrait(
    owner: &EntityId,
    image_url: Option<String>,
    outfits: Option<Vec<Outfit>>,
) -> Portrait {
    let outfits = match outfits {
        Some(list) if !list.is_empty() => list,
        _ => vec![default_outfit(owner, None)],
    };
    Portrait::new(
        EntityId::derived(owner, "portrait-default"),
        DEFAULT_PORTRAIT_NAME,
        image_url,
        outfits,
    )
}

#[must_use]
pub fn default_outfit(owner: &EntityId, image_url: Option<String>) -> Outfit {
    Outfit::new(
        EntityId::derived(owner, "outfit-default"),
        DEFAULT_OUTFIT_NAME,
        image_url,
    )
}
