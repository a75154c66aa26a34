#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use lorebook::config::AppConfig;
use lorebook::wiki::Wiki;
use serde_json::{Value, json};
use tempfile::TempDir;

/// A wiki on a fresh SQLite database in its own temp directory.
pub struct TestWiki {
    pub temp_dir: TempDir,
    pub config: AppConfig,
    pub wiki: Wiki,
}

impl TestWiki {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config = AppConfig::load(temp_dir.path()).expect("load config");
        let wiki = Wiki::open(&config).expect("open wiki");
        Self {
            temp_dir,
            config,
            wiki,
        }
    }

    pub fn in_memory() -> Wiki {
        let store = Arc::new(lorebook::store::MemoryStore::default());
        Wiki::new(store.clone(), store)
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([40, 80, 120, 255]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

/// A character stored before portraits became a list.
pub fn legacy_character() -> Value {
    json!({
        "id": 1,
        "name": "Old Mara",
        "portraitImageUrl": "x",
        "outfits": [{"id": 1, "arcName": "A", "imageUrl": "y"}]
    })
}

/// Backup document from an older build, with a deprecated category.
pub fn legacy_snapshot() -> Value {
    json!({
        "localStorage": {
            "wiki_users": [{"username": "alice", "password": "pw", "role": "admin"}],
            "wiki_current_user": "alice",
            "wiki_synopsis": "The tide remembers.",
            "wiki_characters_Allies": [legacy_character()],
            "wiki_characters_Main_Antagonist": [{"id": "v1", "name": "Warden"}]
        }
    })
}
