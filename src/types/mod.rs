mod image_key;
mod keys;
mod models;
mod user;

pub use image_key::{BLOB_SCHEME, ImageKey};
pub use keys::{Category, RecordKey};
pub use models::{
    Character, DEFAULT_OUTFIT_NAME, DEFAULT_PORTRAIT_NAME, EntityId, GalleryImage, Outfit,
    Portrait, RelationshipLink, Stats, default_outfit, default_portrait,
};
pub use user::{Role, User};
