use serde::Serialize;

use crate::types::{Category, EntityId};
use crate::wiki::arc_facets;

use super::open_wiki;

#[derive(Serialize)]
struct CharacterOutput {
    id: String,
    name: String,
    category: String,
    portraits: usize,
    arcs: Vec<String>,
}

fn parse_category(raw: &str) -> anyhow::Result<Category> {
    raw.parse::<Category>().map_err(anyhow::Error::msg)
}

pub fn run_character_list(
    data_dir: String,
    category: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let (_, wiki) = open_wiki(&data_dir)?;

    let categories = match category {
        Some(raw) => vec![parse_category(&raw)?],
        None => Category::ACTIVE.to_vec(),
    };

    let mut output = Vec::new();
    for category in categories {
        for character in wiki.characters(category)? {
            output.push(CharacterOutput {
                id: character.id.to_string(),
                category: category.label().to_string(),
                portraits: character.portraits.len(),
                arcs: arc_facets(std::slice::from_ref(&character)),
                name: character.name,
            });
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if output.is_empty() {
        println!("No characters found.");
        return Ok(());
    }

    for c in output {
        println!(
            "{:<38} {:<24} {:<18} {} portrait(s)",
            c.id, c.name, c.category, c.portraits
        );
    }

    Ok(())
}

pub fn run_character_show(data_dir: String, id: String) -> anyhow::Result<()> {
    let (_, wiki) = open_wiki(&data_dir)?;

    // Older records use numeric ids.
    let id = match id.parse::<i64>() {
        Ok(n) => EntityId::from(n),
        Err(_) => EntityId::from(id.as_str()),
    };

    let Some((category, character)) = wiki.find_character(&id)? else {
        anyhow::bail!("Character '{id}' not found");
    };

    let mut value = serde_json::to_value(&character)?;
    if let Some(map) = value.as_object_mut() {
        map.insert("category".to_string(), category.label().into());
        let targets = wiki.relationship_targets(&character)?;
        map.insert("resolvedRelationships".to_string(), serde_json::to_value(targets)?);
    }
    println!("{}", serde_json::to_string_pretty(&value)?);

    Ok(())
}
