use serde::Serialize;

use crate::error::Error;

use super::open_wiki;
use super::pickers::{
    confirm_action, get_or_pick_user, get_or_prompt_password, get_or_prompt_username,
    is_last_admin,
};

#[derive(Serialize)]
struct UserOutput {
    username: String,
    role: String,
    bio: Option<String>,
    avatar: Option<String>,
    current: bool,
}

pub fn run_user_add(
    data_dir: String,
    username: Option<String>,
    password: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let (_, wiki) = open_wiki(&data_dir)?;

    let username = get_or_prompt_username(username, non_interactive)?;
    let password = get_or_prompt_password(password, non_interactive)?;

    let user = match wiki.signup(&username, &password) {
        Ok(user) => user,
        Err(Error::AlreadyExists) => anyhow::bail!("User '{username}' already exists"),
        Err(e) => anyhow::bail!(e.user_message()),
    };

    println!();
    println!("Created {} account \"{}\"", user.role, user.username);
    println!();

    Ok(())
}

pub fn run_user_list(data_dir: String, json: bool) -> anyhow::Result<()> {
    let (_, wiki) = open_wiki(&data_dir)?;
    let users = wiki.users()?;
    let current = wiki.current_user()?.map(|u| u.username);

    if json {
        let output: Vec<UserOutput> = users
            .into_iter()
            .map(|u| UserOutput {
                current: current.as_deref() == Some(u.username.as_str()),
                role: u.role.to_string(),
                username: u.username,
                bio: u.bio,
                avatar: u.avatar,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    for user in users {
        let marker = if current.as_deref() == Some(user.username.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{marker} {:<24} {}", user.username, user.role);
    }

    Ok(())
}

pub fn run_user_remove(
    data_dir: String,
    username: Option<String>,
    non_interactive: bool,
    yes: bool,
) -> anyhow::Result<()> {
    let (_, wiki) = open_wiki(&data_dir)?;

    let Some(user) = get_or_pick_user(&wiki, username, non_interactive)? else {
        return Ok(());
    };

    let message = if is_last_admin(&wiki, &user)? {
        format!(
            "Delete user '{}'? They are the only admin.",
            user.username
        )
    } else {
        format!("Delete user '{}'?", user.username)
    };

    if !confirm_action(&message, yes, non_interactive)? {
        println!("Cancelled.");
        return Ok(());
    }

    wiki.delete_user(&user.username)?;

    println!();
    println!("Deleted user '{}'", user.username);
    println!();

    Ok(())
}
