use serde::Serialize;

use crate::types::{Category, RecordKey, Role};

use super::open_wiki;

#[derive(Serialize)]
struct CategoryInfo {
    category: &'static str,
    characters: usize,
}

#[derive(Serialize)]
struct WikiInfo {
    data_dir: String,
    users: usize,
    admins: usize,
    current_user: Option<String>,
    characters: Vec<CategoryInfo>,
    records_present: Vec<&'static str>,
    record_bytes: u64,
    record_quota_bytes: u64,
    images: usize,
    paste_host: String,
    share_base_url: String,
}

pub async fn run_info(data_dir: String, json: bool) -> anyhow::Result<()> {
    let (config, wiki) = open_wiki(&data_dir)?;

    let users = wiki.users()?;
    let mut characters = Vec::new();
    for category in Category::ACTIVE {
        characters.push(CategoryInfo {
            category: category.label(),
            characters: wiki.characters(category)?.len(),
        });
    }

    let info = WikiInfo {
        data_dir: config.data_dir.display().to_string(),
        admins: users.iter().filter(|u| u.role == Role::Admin).count(),
        users: users.len(),
        current_user: wiki.current_user()?.map(|u| u.username),
        characters,
        records_present: wiki
            .records()
            .present_keys()?
            .into_iter()
            .map(RecordKey::as_str)
            .collect(),
        record_bytes: wiki.records().usage_bytes()?,
        record_quota_bytes: wiki.records().quota_bytes(),
        images: wiki.blobs().keys().await?.len(),
        paste_host: config.paste_host.clone(),
        share_base_url: config.share_base_url.clone(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!();
    println!("Lorebook Status");
    println!("{}", "─".repeat(20));
    println!("Data dir:    {}", info.data_dir);
    println!("Users:       {} ({} admin)", info.users, info.admins);
    if let Some(current) = &info.current_user {
        println!("Signed in:   {current}");
    }
    for c in &info.characters {
        println!("{:<12} {}", format!("{}:", c.category), c.characters);
    }
    println!("Images:      {}", info.images);
    println!(
        "Storage:     {} / {} bytes",
        info.record_bytes, info.record_quota_bytes
    );
    println!();

    Ok(())
}
