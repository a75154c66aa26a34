use crate::config::AppConfig;
use crate::wiki::Wiki;

use super::pickers::{get_or_prompt_password, get_or_prompt_username};

pub fn run_init(data_dir: String, non_interactive: bool) -> anyhow::Result<()> {
    let config = AppConfig::load(&data_dir)?;

    if config.db_path().exists() {
        anyhow::bail!(
            "Wiki already initialized. Database exists at: {}",
            config.db_path().display()
        );
    }

    config.save()?;
    let wiki = Wiki::open(&config)?;

    println!();
    println!("Initialized wiki in {}", config.data_dir.display());
    println!("Database:  {}", config.db_path().display());
    println!();

    if !non_interactive {
        create_admin_prompt(&wiki)?;
    }

    Ok(())
}

fn create_admin_prompt(wiki: &Wiki) -> anyhow::Result<()> {
    let create = inquire::Confirm::new("Would you like to create the admin account now?")
        .with_default(true)
        .prompt()?;

    if !create {
        return Ok(());
    }

    let username = get_or_prompt_username(None, false)?;
    let password = get_or_prompt_password(None, false)?;
    let user = wiki.signup(&username, &password)?;

    println!();
    println!("Created {} account \"{}\"", user.role, user.username);
    println!();

    Ok(())
}
