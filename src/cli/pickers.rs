use std::fmt;

use inquire::{InquireError, Password, Select, Text};

use crate::types::{Role, User};
use crate::wiki::Wiki;

/// User with role for display
pub struct UserDisplay(pub User);

impl fmt::Display for UserDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.0.username, self.0.role)
    }
}

fn validate_username(input: &str) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        Err("Username cannot be empty")
    } else if input.contains(char::is_whitespace) {
        Err("Username cannot contain whitespace")
    } else {
        Ok(())
    }
}

/// Get a username from the flag or prompt for one
pub fn get_or_prompt_username(
    username: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<String> {
    if let Some(name) = username {
        validate_username(&name).map_err(anyhow::Error::msg)?;
        return Ok(name);
    }
    if non_interactive {
        anyhow::bail!("--username is required in non-interactive mode");
    }

    Ok(Text::new("Username:")
        .with_validator(|input: &str| {
            Ok(validate_username(input)
                .map(|()| inquire::validator::Validation::Valid)
                .unwrap_or_else(|e| inquire::validator::Validation::Invalid(e.into())))
        })
        .prompt()?)
}

/// Get a password from the flag or prompt for one with confirmation
pub fn get_or_prompt_password(
    password: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    if non_interactive {
        anyhow::bail!("--password is required in non-interactive mode");
    }

    Ok(Password::new("Password:")
        .with_validator(inquire::required!("Password cannot be empty"))
        .prompt()?)
}

/// Get an existing user by name, or pick one interactively
pub fn get_or_pick_user(
    wiki: &Wiki,
    username: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<Option<User>> {
    let users = wiki.users()?;

    if let Some(name) = username {
        return match users.into_iter().find(|u| u.username == name) {
            Some(user) => Ok(Some(user)),
            None => anyhow::bail!("User '{name}' not found"),
        };
    }
    if non_interactive {
        anyhow::bail!("--username is required in non-interactive mode");
    }
    if users.is_empty() {
        println!("No users found.");
        return Ok(None);
    }

    let options: Vec<UserDisplay> = users.into_iter().map(UserDisplay).collect();
    match Select::new("Select user:", options).prompt() {
        Ok(selected) => Ok(Some(selected.0)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Whether removing `user` would leave the wiki without an admin
pub fn is_last_admin(wiki: &Wiki, user: &User) -> anyhow::Result<bool> {
    if user.role != Role::Admin {
        return Ok(false);
    }
    let admins = wiki
        .users()?
        .iter()
        .filter(|u| u.role == Role::Admin)
        .count();
    Ok(admins <= 1)
}

pub fn confirm_action(message: &str, yes: bool, non_interactive: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if non_interactive {
        anyhow::bail!("--yes is required for destructive operations in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message)
            .with_default(false)
            .prompt()?)
    }
}
