use async_trait::async_trait;
use parking_lot::RwLock;

use super::{CredentialRecord, CredentialStore, NewCredential, UserTable};

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    table: RwLock<UserTable>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_records(records: Vec<CredentialRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0);
        Self { table: RwLock::new(UserTable { next_id, users: records }) }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<CredentialRecord>> {
        Ok(self.table.read().find(username).cloned())
    }

    async fn insert(&self, new: NewCredential) -> anyhow::Result<CredentialRecord> {
        Ok(self.table.write().insert(new)?)
    }

    async fn update_password(&self, id: i64, stored_value: &str) -> anyhow::Result<()> {
        let mut t = self.table.write();
        t.get_mut(id)?.password = stored_value.to_string();
        Ok(())
    }

    async fn set_active(&self, id: i64, is_active: bool) -> anyhow::Result<()> {
        let mut t = self.table.write();
        t.get_mut(id)?.is_active = is_active;
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<CredentialRecord>> {
        Ok(self.table.read().users.clone())
    }
}
