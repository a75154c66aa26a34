use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::types::{Character, EntityId, Outfit, default_outfit, default_portrait};

const LEGACY_IMAGE_FIELD: &str = "portraitImageUrl";
const LEGACY_OUTFITS_FIELD: &str = "outfits";
const LIST_FIELDS: [&str; 3] = ["portraits", "relationshipLinks", "arcs"];

/// Single-portrait record from before portraits were a list.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterV1 {
    pub portrait_image_url: Option<String>,
    pub outfits: Vec<Outfit>,
    pub rest: CharacterV2,
}

/// Record with the current fields, some of which still need defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterV2 {
    pub character: Character,
    /// List fields that were absent and decoded as empty.
    pub defaulted: Vec<&'static str>,
    /// Nested entries that had no usable id and were given a derived one.
    pub ids_assigned: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CharacterRecord {
    V1(CharacterV1),
    V2(CharacterV2),
    Current(Character),
}

impl CharacterRecord {
    /// Picks the version by looking at which fields are present.
    pub fn decode(value: &Value) -> Result<Self> {
        let Value::Object(original) = value else {
            return Err(Error::BadRequest("character record is not an object".to_string()));
        };
        let mut map = original.clone();
        let owner = map.get("id").and_then(entity_id);

        let had_legacy =
            map.contains_key(LEGACY_IMAGE_FIELD) || map.contains_key(LEGACY_OUTFITS_FIELD);
        let legacy_image = map.remove(LEGACY_IMAGE_FIELD);
        let legacy_outfits = map.remove(LEGACY_OUTFITS_FIELD);

        let mut defaulted = Vec::new();
        for field in LIST_FIELDS {
            if !map.get(field).is_some_and(Value::is_array) {
                map.insert(field.to_string(), Value::Array(Vec::new()));
                defaulted.push(field);
            }
        }

        let ids_assigned = owner
            .as_ref()
            .map_or(0, |owner| assign_nested_ids(&mut map, owner));

        let character: Character = serde_json::from_value(Value::Object(map))?;
        let rest = CharacterV2 {
            character,
            defaulted,
            ids_assigned,
        };

        if had_legacy {
            let outfits = decode_legacy_outfits(legacy_outfits, &rest.character.id);
            return Ok(Self::V1(CharacterV1 {
                portrait_image_url: legacy_image.and_then(non_empty_string),
                outfits,
                rest,
            }));
        }

        if rest.defaulted.is_empty()
            && rest.ids_assigned == 0
            && rest.character.satisfies_portrait_invariant()
        {
            Ok(Self::Current(rest.character))
        } else {
            Ok(Self::V2(rest))
        }
    }

    #[must_use]
    pub fn version(&self) -> u8 {
        match self {
            Self::V1(_) => 1,
            Self::V2(_) => 2,
            Self::Current(_) => 3,
        }
    }

    /// Runs every remaining upgrade step.
    #[must_use]
    pub fn into_current(self) -> Character {
        match self {
            Self::V1(v1) => upgrade_v2(upgrade_v1(v1)),
            Self::V2(v2) => upgrade_v2(v2),
            Self::Current(character) => character,
        }
    }
}

fn non_empty_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

fn entity_id(value: &Value) -> Option<EntityId> {
    EntityId::deserialize(value).ok()
}

/// Gives every object in `items` whose id is missing, null, or not a string
/// or number an id derived from `owner` and its position.
fn fill_missing_ids(items: &mut [Value], owner: &EntityId, prefix: &str) -> usize {
    let mut assigned = 0;
    for (index, item) in items.iter_mut().enumerate() {
        let Value::Object(entry) = item else {
            continue;
        };
        if entry.get("id").and_then(entity_id).is_none() {
            let id = EntityId::derived(owner, &format!("{prefix}-{index}"));
            entry.insert("id".to_string(), Value::String(id.to_string()));
            assigned += 1;
        }
    }
    assigned
}

fn assign_nested_ids(map: &mut Map<String, Value>, owner: &EntityId) -> usize {
    let mut assigned = 0;
    for (field, prefix) in [
        ("portraits", "portrait"),
        ("gallery", "gallery"),
        ("relationshipLinks", "link"),
    ] {
        if let Some(Value::Array(items)) = map.get_mut(field) {
            assigned += fill_missing_ids(items, owner, prefix);
        }
    }

    if let Some(Value::Array(portraits)) = map.get_mut("portraits") {
        for portrait in portraits {
            let Value::Object(portrait) = portrait else {
                continue;
            };
            let Some(portrait_id) = portrait.get("id").and_then(entity_id) else {
                continue;
            };
            if let Some(Value::Array(outfits)) = portrait.get_mut("outfits") {
                assigned += fill_missing_ids(outfits, &portrait_id, "outfit");
            }
        }
    }
    assigned
}

/// Decodes the bare outfit list entry by entry, so one bad entry does not
/// cost the others.
fn decode_legacy_outfits(value: Option<Value>, owner: &EntityId) -> Vec<Outfit> {
    let mut items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            tracing::warn!("legacy outfits of character {owner} are not a list ({other}), dropping");
            return Vec::new();
        }
    };
    fill_missing_ids(&mut items, owner, "outfit");

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            if !item.is_object() {
                tracing::warn!("dropping legacy outfit {index} of character {owner}: {item}");
                return None;
            }
            match serde_json::from_value(item) {
                Ok(outfit) => Some(outfit),
                Err(e) => {
                    tracing::warn!("dropping legacy outfit {index} of character {owner}: {e}");
                    None
                }
            }
        })
        .collect()
}

/// Wraps the bare image and outfit list into a single "Default Portrait".
/// Records that already carry portraits just lose the legacy fields.
#[must_use]
pub fn upgrade_v1(v1: CharacterV1) -> CharacterV2 {
    let CharacterV1 {
        portrait_image_url,
        outfits,
        mut rest,
    } = v1;

    let has_legacy_content = portrait_image_url.is_some() || !outfits.is_empty();
    if rest.character.portraits.is_empty() && has_legacy_content {
        tracing::debug!(
            "wrapping legacy portrait fields of character {}",
            rest.character.id
        );
        let id = rest.character.id.clone();
        rest.character.portraits = vec![default_portrait(&id, portrait_image_url, Some(outfits))];
    }
    rest
}

/// Guarantees at least one portrait and at least one outfit per portrait.
#[must_use]
pub fn upgrade_v2(v2: CharacterV2) -> Character {
    let mut character = v2.character;

    if character.portraits.is_empty() {
        tracing::debug!("character {} has no portraits, adding default", character.id);
        character.portraits = vec![default_portrait(&character.id, None, None)];
    }

    for portrait in &mut character.portraits {
        if portrait.outfits.is_empty() {
            portrait.outfits.push(default_outfit(&portrait.id, None));
        }
    }

    character
}

/// Outcome of a migration pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Migrated<T> {
    pub value: T,
    pub changed: bool,
}

/// Upgrades one stored record. Current records come back byte-for-byte as
/// they went in; records that cannot be decoded are left alone.
#[must_use]
pub fn migrate_record(value: Value) -> Migrated<Value> {
    let record = match CharacterRecord::decode(&value) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("leaving undecodable character record as is: {e}");
            return Migrated {
                value,
                changed: false,
            };
        }
    };

    if let CharacterRecord::Current(_) = record {
        return Migrated {
            value,
            changed: false,
        };
    }

    let version = record.version();
    let upgraded = record.into_current();
    match serde_json::to_value(&upgraded) {
        Ok(serialized) => {
            tracing::debug!("upgraded character {} from v{version}", upgraded.id);
            Migrated {
                value: serialized,
                changed: true,
            }
        }
        Err(e) => {
            tracing::warn!("failed to serialize upgraded character {}: {e}", upgraded.id);
            Migrated {
                value,
                changed: false,
            }
        }
    }
}

/// Upgrades every record in a category list. `changed` is set only when at
/// least one record was rewritten.
#[must_use]
pub fn migrate_list(values: Vec<Value>) -> Migrated<Vec<Value>> {
    let mut changed = false;
    let value = values
        .into_iter()
        .map(|record| {
            let migrated = migrate_record(record);
            changed |= migrated.changed;
            migrated.value
        })
        .collect();
    Migrated { value, changed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DEFAULT_OUTFIT_NAME, DEFAULT_PORTRAIT_NAME};
    use serde_json::json;

    fn current() -> Value {
        json!({
            "id": "c1",
            "name": "Mara",
            "portraits": [{
                "id": "p1",
                "name": "Travel",
                "imageUrl": "idb://p1",
                "outfits": [{"id": "o1", "arcName": "Act I", "imageUrl": "idb://o1"}]
            }],
            "relationshipLinks": [],
            "arcs": ["Act I"],
            "stats": {"strength": 3, "intelligence": 9, "speed": 5, "durability": 4, "power": 6, "combat": 7}
        })
    }

    #[test]
    fn test_decode_versions() {
        let legacy = json!({"id": 1, "name": "Old", "portraitImageUrl": "x"});
        assert_eq!(CharacterRecord::decode(&legacy).unwrap().version(), 1);

        let partial = json!({"id": 2, "name": "Mid", "portraits": []});
        assert_eq!(CharacterRecord::decode(&partial).unwrap().version(), 2);

        assert_eq!(CharacterRecord::decode(&current()).unwrap().version(), 3);
        assert!(CharacterRecord::decode(&json!("nope")).is_err());
    }

    #[test]
    fn test_legacy_single_portrait_upgrade() {
        let legacy = json!({
            "id": 1,
            "name": "Old",
            "portraitImageUrl": "x",
            "outfits": [{"id": 1, "arcName": "A", "imageUrl": "y"}]
        });

        let migrated = migrate_record(legacy);
        assert!(migrated.changed);

        let character: Character = serde_json::from_value(migrated.value.clone()).unwrap();
        assert_eq!(character.portraits.len(), 1);
        let portrait = &character.portraits[0];
        assert_eq!(portrait.name, DEFAULT_PORTRAIT_NAME);
        assert_eq!(portrait.image_url.as_deref(), Some("x"));
        assert_eq!(portrait.outfits.len(), 1);
        assert_eq!(portrait.outfits[0].arc_name, "A");
        assert_eq!(portrait.outfits[0].image_url.as_deref(), Some("y"));

        assert!(migrated.value.get("portraitImageUrl").is_none());
        assert!(migrated.value.get("outfits").is_none());
        assert_eq!(migrated.value["arcs"], json!([]));
        assert_eq!(migrated.value["relationshipLinks"], json!([]));
    }

    #[test]
    fn test_legacy_image_without_outfits_gets_default_outfit() {
        let migrated = migrate_record(json!({"id": 1, "name": "Old", "portraitImageUrl": "x"}));
        let character: Character = serde_json::from_value(migrated.value).unwrap();
        assert_eq!(character.portraits[0].outfits[0].arc_name, DEFAULT_OUTFIT_NAME);
        assert_eq!(character.portraits[0].outfits[0].image_url, None);
    }

    #[test]
    fn test_legacy_fields_dropped_when_portraits_exist() {
        let mut record = current();
        record["portraitImageUrl"] = json!("stale");
        let migrated = migrate_record(record);
        assert!(migrated.changed);
        assert!(migrated.value.get("portraitImageUrl").is_none());
        assert_eq!(migrated.value["portraits"][0]["name"], json!("Travel"));
    }

    #[test]
    fn test_empty_portraits_and_outfits_filled() {
        let migrated = migrate_record(json!({
            "id": "c9",
            "name": "Blank",
            "portraits": [],
            "relationshipLinks": [],
            "arcs": []
        }));
        let character: Character = serde_json::from_value(migrated.value).unwrap();
        assert!(character.satisfies_portrait_invariant());

        let migrated = migrate_record(json!({
            "id": "c10",
            "name": "Bare",
            "portraits": [{"id": "p", "name": "Only", "outfits": []}],
            "relationshipLinks": [],
            "arcs": []
        }));
        assert!(migrated.changed);
        let character: Character = serde_json::from_value(migrated.value).unwrap();
        assert_eq!(character.portraits[0].name, "Only");
        assert_eq!(character.portraits[0].outfits.len(), 1);
    }

    #[test]
    fn test_legacy_outfits_without_ids_carried_over() {
        let migrated = migrate_record(json!({
            "id": 1,
            "name": "Old",
            "portraitImageUrl": "x",
            "outfits": [
                {"arcName": "A", "imageUrl": "y"},
                "not an outfit",
                {"id": null, "arcName": "B"}
            ]
        }));
        assert!(migrated.changed);

        let character: Character = serde_json::from_value(migrated.value).unwrap();
        let outfits = &character.portraits[0].outfits;
        let arcs: Vec<_> = outfits.iter().map(|o| o.arc_name.as_str()).collect();
        assert_eq!(arcs, vec!["A", "B"]);
        assert_eq!(outfits[0].image_url.as_deref(), Some("y"));
        assert_eq!(outfits[0].id, EntityId::from("1-outfit-0"));
        assert_eq!(outfits[1].id, EntityId::from("1-outfit-2"));
    }

    #[test]
    fn test_nested_entries_without_ids_get_stable_ids() {
        let input = json!({
            "id": "c4",
            "name": "Patchy",
            "portraits": [{"name": "Travel", "outfits": [{"arcName": "Act I"}]}],
            "gallery": [{"caption": "sketch", "imageUrl": "idb://g"}],
            "relationshipLinks": [{"targetName": "Outsider"}],
            "arcs": [],
            "stats": {"strength": "7"}
        });

        let first = migrate_record(input.clone());
        assert!(first.changed);
        let character: Character = serde_json::from_value(first.value.clone()).unwrap();
        assert_eq!(character.portraits[0].id, EntityId::from("c4-portrait-0"));
        assert_eq!(
            character.portraits[0].outfits[0].id,
            EntityId::from("c4-portrait-0-outfit-0")
        );
        assert_eq!(character.portraits[0].outfits[0].arc_name, "Act I");
        assert_eq!(character.gallery[0].id, EntityId::from("c4-gallery-0"));
        assert_eq!(character.relationship_links[0].id, EntityId::from("c4-link-0"));
        assert_eq!(character.stats.as_ref().unwrap().strength, 7);

        let second = migrate_record(first.value.clone());
        assert!(!second.changed);
        assert_eq!(migrate_record(input).value, first.value);
    }

    #[test]
    fn test_current_record_untouched() {
        let migrated = migrate_record(current());
        assert!(!migrated.changed);
        assert_eq!(migrated.value, current());
    }

    #[test]
    fn test_migration_is_idempotent() {
        let input = vec![
            json!({"id": 1, "name": "Old", "portraitImageUrl": "x", "outfits": []}),
            json!({"id": 2, "name": "Mid"}),
            current(),
        ];

        let first = migrate_list(input.clone());
        assert!(first.changed);

        let second = migrate_list(first.value.clone());
        assert!(!second.changed);
        assert_eq!(second.value, first.value);

        let again = migrate_list(input);
        assert_eq!(again.value, first.value);
    }

    #[test]
    fn test_undecodable_record_left_alone() {
        let migrated = migrate_list(vec![json!(42), json!({"name": "no id"})]);
        assert!(!migrated.changed);
        assert_eq!(migrated.value, vec![json!(42), json!({"name": "no id"})]);
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let migrated = migrate_record(json!({"id": 3, "name": "Odd", "faction": "Tide"}));
        let character: Character = serde_json::from_value(migrated.value).unwrap();
        assert_eq!(character.extra["faction"], json!("Tide"));
    }
}
