use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};

use crate::db::IdGenerator;
use crate::models::user::{Role, User};

/// In-memory user records keyed by email. All mutations of one user happen
/// under that key's shard lock.
#[derive(Clone, Default)]
pub struct UserStore {
    users: Arc<DashMap<String, User>>,
    emails_by_id: Arc<DashMap<i64, String>>,
    ids: Arc<IdGenerator>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new user unless the email is already taken. The check and
    /// the insert are one step under the key's lock.
    pub fn insert(&self, email: &str, password_hash: String, role: Role) -> Option<User> {
        match self.users.entry(email.to_string()) {
            Entry::Occupied(_) => {
                debug!(%email, "Email already registered");
                None
            }
            Entry::Vacant(slot) => {
                let user = User {
                    id: self.ids.next_id(),
                    email: email.to_string(),
                    password_hash,
                    role,
                    refresh_token: None,
                };
                self.emails_by_id.insert(user.id, user.email.clone());
                slot.insert(user.clone());
                info!(user_id = user.id, role = ?user.role, "User created");
                Some(user)
            }
        }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.users.contains_key(email)
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.get(email).map(|user| user.clone())
    }

    pub fn find_by_id(&self, id: i64) -> Option<User> {
        let email = self.emails_by_id.get(&id)?.clone();
        self.find_by_email(&email)
    }

    /// Overwrites the stored refresh token. Returns false for unknown emails.
    pub fn set_refresh_token(&self, email: &str, token: Option<String>) -> bool {
        match self.users.get_mut(email) {
            Some(mut user) => {
                user.refresh_token = token;
                true
            }
            None => false,
        }
    }

    /// Replaces the stored refresh token only if it still equals `current`.
    pub fn rotate_refresh_token(&self, user_id: i64, current: &str, next: String) -> bool {
        let Some(email) = self.emails_by_id.get(&user_id).map(|e| e.clone()) else {
            return false;
        };
        let Some(mut user) = self.users.get_mut(&email) else {
            return false;
        };

        if user.refresh_token.as_deref() != Some(current) {
            return false;
        }
        user.refresh_token = Some(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_is_rejected() {
        let store = UserStore::new();
        let first = store.insert("a@x.com", "hash".into(), Role::User);
        assert!(first.is_some());

        assert!(store.insert("a@x.com", "other".into(), Role::Admin).is_none());
        assert_eq!(store.find_by_email("a@x.com").unwrap().password_hash, "hash");
    }

    #[test]
    fn finds_by_id_through_index() {
        let store = UserStore::new();
        let user = store.insert("a@x.com", "hash".into(), Role::User).unwrap();

        assert_eq!(store.find_by_id(user.id).unwrap().email, "a@x.com");
        assert!(store.find_by_id(user.id + 1).is_none());
    }

    #[test]
    fn rotation_requires_current_token() {
        let store = UserStore::new();
        let user = store.insert("a@x.com", "hash".into(), Role::User).unwrap();
        assert!(store.set_refresh_token("a@x.com", Some("one".into())));

        assert!(!store.rotate_refresh_token(user.id, "stale", "two".into()));
        assert!(store.rotate_refresh_token(user.id, "one", "two".into()));
        assert!(!store.rotate_refresh_token(user.id, "one", "three".into()));
        assert_eq!(
            store.find_by_email("a@x.com").unwrap().refresh_token.as_deref(),
            Some("two")
        );
    }

    #[test]
    fn unknown_email_cannot_hold_refresh_token() {
        let store = UserStore::new();
        assert!(!store.set_refresh_token("ghost@x.com", None));
    }

    #[test]
    fn concurrent_registration_has_one_winner() {
        let store = UserStore::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.insert("race@x.com", format!("hash-{i}"), Role::User).is_some()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert!(store.find_by_email("race@x.com").is_some());
    }
}
