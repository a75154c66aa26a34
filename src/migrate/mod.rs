//! Load-time upgrades of stored character data.
//!
//! Character records are decoded into an explicit version at the
//! deserialization boundary and upgraded one step at a time:
//!
//! - [`CharacterV1`]: single-portrait shape with bare `portraitImageUrl` /
//!   `outfits` fields.
//! - [`CharacterV2`]: has the current fields, but some lists are missing or
//!   a portrait list or outfit list is empty.
//! - [`Character`](crate::types::Character): current shape, left untouched.
//!
//! Deprecated categories are folded into their replacements by
//! [`merge_deprecated_categories`].

mod category;
mod character;

pub use category::merge_deprecated_categories;
pub use character::{
    CharacterRecord, CharacterV1, CharacterV2, Migrated, migrate_list, migrate_record, upgrade_v1,
    upgrade_v2,
};
