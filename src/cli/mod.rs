mod character;
mod commands;
mod image;
mod info;
mod init;
pub mod pickers;
mod share;
mod snapshot;
mod user;

pub use character::{run_character_list, run_character_show};
pub use commands::{CharacterCommands, ImageCommands, ImageSlot, UserCommands};
pub use image::run_image_add;
pub use info::run_info;
pub use init::run_init;
pub use share::{ShareFormat, run_open, run_share};
pub use snapshot::{run_export, run_import, run_migrate};
pub use user::{run_user_add, run_user_list, run_user_remove};

use crate::config::AppConfig;
use crate::wiki::Wiki;

/// Open the wiki in a data directory, checking it was initialized
pub fn open_wiki(data_dir: &str) -> anyhow::Result<(AppConfig, Wiki)> {
    let config = AppConfig::load(data_dir)?;

    if !config.db_path().exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'lorebook init' first.",
            config.db_path().display()
        );
    }

    let wiki = Wiki::open(&config)?;
    Ok((config, wiki))
}
