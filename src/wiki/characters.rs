use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Wiki;
use crate::error::{Error, Result};
use crate::migrate::{merge_deprecated_categories, migrate_list};
use crate::types::{Category, Character, EntityId};

/// A relationship link with its target resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipTarget {
    pub link_id: EntityId,
    /// Set only when the target is a character currently in the wiki.
    pub target_id: Option<EntityId>,
    pub name: String,
    pub description: String,
}

impl Wiki {
    /// Loads a category, upgrading stored records on the way.
    ///
    /// Deprecated categories are folded into their replacements first, so
    /// asking for one returns an empty list. Upgraded records are written
    /// back only when something changed; a failed write-back is logged and
    /// the upgraded list is still returned. Records that still cannot be
    /// read are left out of the result but stay in storage.
    pub fn characters(&self, category: Category) -> Result<Vec<Character>> {
        Ok(self
            .stored_characters(category)?
            .into_iter()
            .filter_map(|record| match serde_json::from_value(record) {
                Ok(character) => Some(character),
                Err(e) => {
                    tracing::warn!("skipping unreadable {category} record: {e}");
                    None
                }
            })
            .collect())
    }

    /// The upgraded list as stored, unreadable records included.
    fn stored_characters(&self, category: Category) -> Result<Vec<Value>> {
        if let Err(e) = merge_deprecated_categories(self.records()) {
            tracing::warn!("category merge failed, will retry on next load: {e}");
        }

        let raw = match self.records.get(category.record_key())? {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(other) => {
                tracing::warn!("{category} list is not an array ({other}), ignoring it");
                return Ok(Vec::new());
            }
        };

        let migrated = migrate_list(raw);
        if migrated.changed {
            let value = Value::Array(migrated.value.clone());
            match self.records.set(category.record_key(), &value) {
                Ok(()) => tracing::info!("wrote back upgraded {category} list"),
                Err(e) => tracing::warn!("failed to write back upgraded {category} list: {e}"),
            }
        }
        Ok(migrated.value)
    }

    fn check_writable<'a>(
        category: Category,
        characters: impl IntoIterator<Item = &'a Character>,
    ) -> Result<()> {
        if category.is_deprecated() {
            return Err(Error::BadRequest(format!(
                "{category} is no longer used, save to {} instead",
                category.replacement().unwrap_or(category)
            )));
        }
        if let Some(bad) = characters
            .into_iter()
            .find(|c| !c.satisfies_portrait_invariant())
        {
            return Err(Error::BadRequest(format!(
                "character {} needs at least one portrait with an outfit",
                bad.id
            )));
        }
        Ok(())
    }

    /// Replaces the whole list for `category`.
    pub fn save_characters(&self, category: Category, characters: &[Character]) -> Result<()> {
        Self::check_writable(category, characters)?;
        self.write(category.record_key(), characters)
    }

    /// Inserts `character`, or replaces the one with the same id. Other
    /// stored records are written back exactly as they were.
    pub fn upsert_character(&self, category: Category, character: Character) -> Result<()> {
        Self::check_writable(category, [&character])?;
        let mut records = self.stored_characters(category)?;
        let value = serde_json::to_value(&character)?;
        match records
            .iter_mut()
            .find(|r| record_id(r).as_ref() == Some(&character.id))
        {
            Some(existing) => *existing = value,
            None => records.push(value),
        }
        self.write(category.record_key(), &records)
    }

    /// Returns whether a character was removed.
    pub fn delete_character(&self, category: Category, id: &EntityId) -> Result<bool> {
        if category.is_deprecated() {
            return Ok(false);
        }
        let mut records = self.stored_characters(category)?;
        let before = records.len();
        records.retain(|r| record_id(r).as_ref() != Some(id));
        if records.len() == before {
            return Ok(false);
        }
        self.write(category.record_key(), &records)?;
        Ok(true)
    }

    pub fn find_character(&self, id: &EntityId) -> Result<Option<(Category, Character)>> {
        for category in Category::ACTIVE {
            if let Some(found) = self.characters(category)?.into_iter().find(|c| &c.id == id) {
                return Ok(Some((category, found)));
            }
        }
        Ok(None)
    }

    /// Resolves each outgoing link to the target's current name, falling
    /// back to the stored name for external or deleted targets.
    pub fn relationship_targets(&self, character: &Character) -> Result<Vec<RelationshipTarget>> {
        let mut names = HashMap::new();
        for category in Category::ACTIVE {
            for other in self.characters(category)? {
                names.insert(other.id, other.name);
            }
        }

        Ok(character
            .relationship_links
            .iter()
            .map(|link| {
                let resolved = link
                    .target_id
                    .as_ref()
                    .and_then(|id| names.get(id).map(|name| (id.clone(), name.clone())));
                match resolved {
                    Some((id, name)) => RelationshipTarget {
                        link_id: link.id.clone(),
                        target_id: Some(id),
                        name,
                        description: link.description.clone(),
                    },
                    None => RelationshipTarget {
                        link_id: link.id.clone(),
                        target_id: None,
                        name: link.target_name.clone(),
                        description: link.description.clone(),
                    },
                }
            })
            .collect())
    }
}

fn record_id(record: &Value) -> Option<EntityId> {
    record.get("id").and_then(|id| EntityId::deserialize(id).ok())
}

/// Sorted union of every arc tag and outfit arc name.
#[must_use]
pub fn arc_facets(characters: &[Character]) -> Vec<String> {
    let mut facets = BTreeSet::new();
    for character in characters {
        facets.extend(character.arcs.iter().map(|a| a.trim()));
        for portrait in &character.portraits {
            facets.extend(portrait.outfits.iter().map(|o| o.arc_name.trim()));
        }
    }
    facets
        .into_iter()
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}
