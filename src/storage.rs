//!
//! gympro credential storage
//! -------------------------
//! The login core only needs a handful of operations from the user table:
//! lookup by username, password rewrite, insert and the active flag. They are
//! expressed by the `CredentialStore` trait so the core can run against the
//! JSON file store in production and the in-memory store in tests.
//!
//! Stores persist the password value exactly as given. Hashing happens in
//! `crate::security` before anything reaches a store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::identity::{Identity, Role};

mod file;
mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

/// One row of the user table, as far as authentication is concerned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub id: i64,
    pub username: String,
    /// Either a tagged hash (`$2b$..`, `$argon2id$..`) or a legacy plaintext value.
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool { true }

impl CredentialRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            full_name: self.full_name.clone(),
            is_active: self.is_active,
        }
    }
}

/// Insert payload; `password` is the value to store verbatim.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("username '{0}' already exists")]
    DuplicateUsername(String),
    #[error("user id {0} not found")]
    NotFound(i64),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<CredentialRecord>>;
    async fn insert(&self, new: NewCredential) -> anyhow::Result<CredentialRecord>;
    async fn update_password(&self, id: i64, stored_value: &str) -> anyhow::Result<()>;
    async fn set_active(&self, id: i64, is_active: bool) -> anyhow::Result<()>;
    async fn list(&self) -> anyhow::Result<Vec<CredentialRecord>>;
}

pub type SharedCredentialStore = Arc<dyn CredentialStore>;

/// Row table shared by both store implementations.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserTable {
    #[serde(default)]
    pub next_id: i64,
    #[serde(default)]
    pub users: Vec<CredentialRecord>,
}

impl UserTable {
    pub fn find(&self, username: &str) -> Option<&CredentialRecord> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn insert(&mut self, new: NewCredential) -> Result<CredentialRecord, StoreError> {
        if self.find(&new.username).is_some() {
            return Err(StoreError::DuplicateUsername(new.username));
        }
        // next_id may lag behind rows written by hand
        let max_id = self.users.iter().map(|u| u.id).max().unwrap_or(0);
        let id = self.next_id.max(max_id) + 1;
        self.next_id = id;
        let rec = CredentialRecord {
            id,
            username: new.username,
            password: new.password,
            role: new.role,
            full_name: new.full_name,
            is_active: new.is_active,
        };
        self.users.push(rec.clone());
        Ok(rec)
    }

    pub fn get_mut(&mut self, id: i64) -> Result<&mut CredentialRecord, StoreError> {
        self.users.iter_mut().find(|u| u.id == id).ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_cred(name: &str) -> NewCredential {
        NewCredential { username: name.into(), password: "x".into(), role: Role::Client, full_name: None, is_active: true }
    }

    #[test]
    fn ids_are_monotonic_and_skip_hand_written_rows() {
        let mut t = UserTable::default();
        assert_eq!(t.insert(new_cred("a")).unwrap().id, 1);
        t.users.push(CredentialRecord { id: 10, ..t.users[0].clone() });
        t.users[1].username = "manual".into();
        assert_eq!(t.insert(new_cred("b")).unwrap().id, 11);
    }

    #[test]
    fn duplicate_username_rejected() {
        let mut t = UserTable::default();
        t.insert(new_cred("dup")).unwrap();
        assert_eq!(t.insert(new_cred("dup")), Err(StoreError::DuplicateUsername("dup".into())));
    }

    #[test]
    fn record_deserializes_with_missing_optional_fields() {
        let rec: CredentialRecord = serde_json::from_str(
            r#"{"id":3,"username":"old","password":"plain","role":"trainer"}"#,
        ).unwrap();
        assert!(rec.is_active);
        assert_eq!(rec.full_name, None);
        assert_eq!(rec.identity().role, Role::Trainer);
    }
}
