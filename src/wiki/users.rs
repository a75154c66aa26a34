use serde_json::Value;

use super::Wiki;
use crate::error::{Error, Result};
use crate::types::{RecordKey, Role, User};

impl Wiki {
    pub fn users(&self) -> Result<Vec<User>> {
        Ok(self.read(RecordKey::Users)?.unwrap_or_default())
    }

    /// Creates an account. The first account on an empty wiki is an admin.
    pub fn signup(&self, username: &str, password: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::BadRequest("username cannot be empty".to_string()));
        }
        if password.is_empty() {
            return Err(Error::BadRequest("password cannot be empty".to_string()));
        }

        let mut users = self.users()?;
        if users.iter().any(|u| u.username == username) {
            return Err(Error::AlreadyExists);
        }

        let user = User {
            username: username.to_string(),
            password: password.to_string(),
            role: Role::for_new_user(users.len()),
            bio: None,
            avatar: None,
        };
        users.push(user.clone());
        self.write(RecordKey::Users, &users)?;

        tracing::info!("created {} account {}", user.role, user.username);
        Ok(user)
    }

    /// Returns the account and marks it signed in when the credentials match.
    pub fn login(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self
            .users()?
            .into_iter()
            .find(|u| u.username == username && u.password == password)
        else {
            return Ok(None);
        };

        self.write(RecordKey::CurrentUser, &user.username)?;
        Ok(Some(user))
    }

    pub fn logout(&self) -> Result<()> {
        self.records.remove(RecordKey::CurrentUser)
    }

    /// The signed-in account, if the pointer still names an existing user.
    pub fn current_user(&self) -> Result<Option<User>> {
        let username = match self.records.get(RecordKey::CurrentUser)? {
            Some(Value::String(name)) => name,
            // Older data stored the whole user object.
            Some(Value::Object(map)) => match map.get("username") {
                Some(Value::String(name)) => name.clone(),
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };

        Ok(self.users()?.into_iter().find(|u| u.username == username))
    }

    pub fn update_profile(
        &self,
        username: &str,
        bio: Option<String>,
        avatar: Option<String>,
    ) -> Result<User> {
        let mut users = self.users()?;
        let user = users
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or(Error::NotFound)?;
        user.bio = bio.filter(|b| !b.trim().is_empty());
        user.avatar = avatar.filter(|a| !a.is_empty());
        let updated = user.clone();

        self.write(RecordKey::Users, &users)?;
        Ok(updated)
    }

    /// Removes an account, signing it out if it is the current one.
    pub fn delete_user(&self, username: &str) -> Result<()> {
        let mut users = self.users()?;
        let before = users.len();
        users.retain(|u| u.username != username);
        if users.len() == before {
            return Err(Error::NotFound);
        }

        self.write(RecordKey::Users, &users)?;
        if self.current_user()?.is_none() {
            self.logout()?;
        }

        tracing::info!("deleted account {username}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::{MemoryStore, RecordStore};
    use serde_json::json;

    fn wiki() -> Wiki {
        let store = Arc::new(MemoryStore::default());
        Wiki::new(store.clone(), store)
    }

    #[test]
    fn test_first_run_admin_bootstrap() {
        let wiki = wiki();
        assert!(wiki.users().unwrap().is_empty());

        let alice = wiki.signup("alice", "pw1").unwrap();
        assert_eq!(alice.role, Role::Admin);

        let bob = wiki.signup("bob", "pw2").unwrap();
        assert_eq!(bob.role, Role::Viewer);

        let stored = wiki.users().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].role, Role::Admin);
    }

    #[test]
    fn test_signup_validation() {
        let wiki = wiki();
        wiki.signup("alice", "pw").unwrap();
        assert!(matches!(wiki.signup("alice", "x"), Err(Error::AlreadyExists)));
        assert!(matches!(wiki.signup("  ", "x"), Err(Error::BadRequest(_))));
        assert!(matches!(wiki.signup("carol", ""), Err(Error::BadRequest(_))));
        // Usernames are case-sensitive.
        assert!(wiki.signup("Alice", "pw").is_ok());
    }

    #[test]
    fn test_login_and_logout() {
        let wiki = wiki();
        wiki.signup("alice", "pw").unwrap();

        assert_eq!(wiki.login("alice", "wrong").unwrap(), None);
        assert_eq!(wiki.current_user().unwrap(), None);

        let user = wiki.login("alice", "pw").unwrap().unwrap();
        assert_eq!(wiki.current_user().unwrap(), Some(user));

        wiki.logout().unwrap();
        assert_eq!(wiki.current_user().unwrap(), None);
    }

    #[test]
    fn test_current_user_accepts_stored_object() {
        let store = Arc::new(MemoryStore::default());
        let wiki = Wiki::new(store.clone(), store.clone());
        wiki.signup("alice", "pw").unwrap();
        store
            .set(RecordKey::CurrentUser, &json!({"username": "alice", "role": "admin"}))
            .unwrap();
        assert_eq!(wiki.current_user().unwrap().unwrap().username, "alice");
    }

    #[test]
    fn test_update_profile_and_delete() {
        let wiki = wiki();
        wiki.signup("alice", "pw").unwrap();
        wiki.login("alice", "pw").unwrap();

        let updated = wiki
            .update_profile("alice", Some("Archivist".into()), Some("idb://a".into()))
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Archivist"));
        assert_eq!(wiki.users().unwrap()[0].avatar.as_deref(), Some("idb://a"));

        assert!(matches!(
            wiki.update_profile("nobody", None, None),
            Err(Error::NotFound)
        ));

        wiki.delete_user("alice").unwrap();
        assert!(wiki.users().unwrap().is_empty());
        assert_eq!(wiki.current_user().unwrap(), None);
        assert!(matches!(wiki.delete_user("alice"), Err(Error::NotFound)));
    }

    #[test]
    fn test_signup_capacity_rollback() {
        let store = Arc::new(MemoryStore::new(120));
        let wiki = Wiki::new(store.clone(), store);
        wiki.signup("alice", "pw").unwrap();
        let before = wiki.users().unwrap();

        let result = wiki.signup("bob", &"p".repeat(200));
        assert!(matches!(result, Err(Error::CapacityExceeded)));
        assert_eq!(wiki.users().unwrap(), before);
    }
}
