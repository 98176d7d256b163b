use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{CredentialRecord, CredentialStore, NewCredential, UserTable};

/// User table persisted as one JSON document (`users.json`).
///
/// The whole table is loaded at open and kept in memory; every write rewrites
/// the document through a temp file and a rename so readers never see a
/// half-written file.
pub struct FileCredentialStore {
    path: PathBuf,
    table: RwLock<UserTable>,
}

impl FileCredentialStore {
    /// Opens `path`, treating a missing file as an empty table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let table = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading user table {}", path.display()))?;
            serde_json::from_str::<UserTable>(&raw)
                .with_context(|| format!("parsing user table {}", path.display()))?
        } else {
            UserTable::default()
        };
        debug!(target: "storage", path = %path.display(), users = table.users.len(), "user table opened");
        Ok(Self { path, table: RwLock::new(table) })
    }

    pub fn path(&self) -> &Path { &self.path }

    fn persist(&self, table: &UserTable) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(table)?;
        fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    // Applies `f` to a copy so a failed write leaves the in-memory table untouched.
    fn mutate<T>(&self, f: impl FnOnce(&mut UserTable) -> Result<T>) -> Result<T> {
        let mut guard = self.table.write();
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(out)
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<CredentialRecord>> {
        Ok(self.table.read().find(username).cloned())
    }

    async fn insert(&self, new: NewCredential) -> Result<CredentialRecord> {
        self.mutate(|t| Ok(t.insert(new)?))
    }

    async fn update_password(&self, id: i64, stored_value: &str) -> Result<()> {
        self.mutate(|t| {
            t.get_mut(id)?.password = stored_value.to_string();
            Ok(())
        })
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<()> {
        self.mutate(|t| {
            t.get_mut(id)?.is_active = is_active;
            Ok(())
        })
    }

    async fn list(&self) -> Result<Vec<CredentialRecord>> {
        Ok(self.table.read().users.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;
    use tempfile::tempdir;

    fn cred(name: &str, pw: &str) -> NewCredential {
        NewCredential { username: name.into(), password: pw.into(), role: Role::Trainer, full_name: None, is_active: true }
    }

    #[tokio::test]
    async fn writes_survive_reopen() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("nested").join("users.json");
        {
            let s = FileCredentialStore::open(&path)?;
            let r = s.insert(cred("trainer1", "$argon2id$v=19$stub")).await?;
            s.set_active(r.id, false).await?;
        }
        let s = FileCredentialStore::open(&path)?;
        let r = s.find_by_username("trainer1").await?.expect("persisted");
        assert_eq!(r.password, "$argon2id$v=19$stub");
        assert!(!r.is_active);
        assert!(!path.with_extension("json.tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn rejected_insert_does_not_touch_disk() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("users.json");
        let s = FileCredentialStore::open(&path)?;
        s.insert(cred("a", "1")).await?;
        let before = fs::read_to_string(&path)?;
        assert!(s.insert(cred("a", "2")).await.is_err());
        assert_eq!(fs::read_to_string(&path)?, before);
        assert_eq!(s.list().await?.len(), 1);
        Ok(())
    }

    #[test]
    fn corrupt_document_is_an_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("users.json");
        fs::write(&path, "{not json").unwrap();
        assert!(FileCredentialStore::open(&path).is_err());
    }
}
