//!
//! gympro credential verification
//! ------------------------------
//! Stored passwords come in three shapes:
//! - bcrypt (`$2a$`, `$2b$`, `$2y$`), written by the previous user store;
//! - Argon2 PHC strings (`$argon2id$...`), written by every current write path;
//! - legacy plaintext rows that predate hashing.
//!
//! `CredentialVerifier` dispatches on that prefix so old rows keep working
//! until their next password change. Plaintext comparison is not constant-time
//! and only exists for the migration window.

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use futures_util::FutureExt;
use password_hash::{PasswordHash, SaltString};
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{LoginError, LoginResult};
use crate::identity::{Identity, Role};
use crate::storage::{CredentialRecord, CredentialStore, NewCredential, SharedCredentialStore};

pub const DEMO_PASSWORD: &str = "pass123";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredPassword {
    Bcrypt,
    Argon2,
    Plaintext,
}

pub fn classify(stored: &str) -> StoredPassword {
    if ["$2a$", "$2b$", "$2y$"].iter().any(|p| stored.starts_with(p)) {
        StoredPassword::Bcrypt
    } else if stored.starts_with("$argon2") {
        StoredPassword::Argon2
    } else {
        StoredPassword::Plaintext
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

/// Hashes on the blocking pool; Argon2 is deliberately slow.
pub async fn hash_password_blocking(password: &str) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| anyhow!("hash task join error: {}", e))?
}

// A hash-shaped value that does not parse is a mismatch, never a plaintext compare.
fn verify_hashed(kind: StoredPassword, stored: &str, password: &str) -> bool {
    match kind {
        StoredPassword::Bcrypt => match bcrypt::verify(password, stored) {
            Ok(ok) => ok,
            Err(e) => {
                warn!(target: "auth", "unreadable bcrypt hash: {}", e);
                false
            }
        },
        StoredPassword::Argon2 => {
            if let Ok(parsed) = PasswordHash::new(stored) {
                Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
            } else {
                warn!(target: "auth", "unreadable argon2 hash");
                false
            }
        }
        StoredPassword::Plaintext => false,
    }
}

/// Compare a supplied password with the stored value, whatever its shape.
pub async fn verify_password(stored: &str, password: &str) -> Result<bool> {
    match classify(stored) {
        StoredPassword::Plaintext => Ok(stored.as_bytes() == password.as_bytes()),
        kind => {
            let stored = stored.to_string();
            let password = password.to_string();
            tokio::task::spawn_blocking(move || verify_hashed(kind, &stored, &password))
                .await
                .map_err(|e| anyhow!("verify task join error: {}", e))
        }
    }
}

/// Checks a username/password pair against the credential store.
#[derive(Clone)]
pub struct CredentialVerifier {
    store: SharedCredentialStore,
    lookup_timeout: Duration,
    rehash_legacy: bool,
}

impl CredentialVerifier {
    pub fn new(store: SharedCredentialStore, lookup_timeout: Duration) -> Self {
        Self { store, lookup_timeout, rehash_legacy: false }
    }

    pub fn with_rehash_legacy(mut self, on: bool) -> Self {
        self.rehash_legacy = on;
        self
    }

    /// Bounded lookup. Store errors and panics become `BackingStoreFault`,
    /// an elapsed bound becomes `BackingStoreTimeout`.
    async fn lookup(&self, username: &str) -> LoginResult<Option<CredentialRecord>> {
        let fut = AssertUnwindSafe(self.store.find_by_username(username)).catch_unwind();
        match tokio::time::timeout(self.lookup_timeout, fut).await {
            Ok(Ok(Ok(rec))) => Ok(rec),
            Ok(Ok(Err(e))) => Err(LoginError::BackingStoreFault(format!("{:#}", e))),
            Ok(Err(_panic)) => Err(LoginError::BackingStoreFault("credential lookup panicked".into())),
            Err(_elapsed) => Err(LoginError::BackingStoreTimeout(self.lookup_timeout.as_millis() as u64)),
        }
    }

    pub async fn verify(&self, username: &str, password: &str) -> LoginResult<Identity> {
        let Some(rec) = self.lookup(username).await? else {
            return Err(LoginError::InvalidCredentials);
        };
        if !rec.is_active {
            return Err(LoginError::AccountDisabled);
        }
        let kind = classify(&rec.password);
        let ok = verify_password(&rec.password, password)
            .await
            .map_err(|e| LoginError::BackingStoreFault(e.to_string()))?;
        if !ok {
            return Err(LoginError::InvalidCredentials);
        }
        if kind == StoredPassword::Plaintext && self.rehash_legacy {
            self.migrate(&rec, password).await;
        }
        Ok(rec.identity())
    }

    // Best effort: the login already succeeded.
    async fn migrate(&self, rec: &CredentialRecord, password: &str) {
        let res = match hash_password_blocking(password).await {
            Ok(h) => self.store.update_password(rec.id, &h).await,
            Err(e) => Err(e),
        };
        match res {
            Ok(()) => info!(target: "auth", user = %rec.username, "legacy password rehashed"),
            Err(e) => warn!(target: "auth", user = %rec.username, "legacy password rehash failed: {:#}", e),
        }
    }
}

/// Create a user with a freshly hashed password.
pub async fn add_user(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
    role: Role,
    full_name: Option<String>,
) -> Result<CredentialRecord> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(anyhow!("username and password required"));
    }
    let hash = hash_password_blocking(password).await?;
    store.insert(NewCredential {
        username: username.to_string(),
        password: hash,
        role,
        full_name,
        is_active: true,
    }).await
}

pub async fn change_password(store: &dyn CredentialStore, username: &str, password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(anyhow!("password required"));
    }
    let rec = store
        .find_by_username(username)
        .await?
        .ok_or_else(|| anyhow!("user '{}' not found", username))?;
    let hash = hash_password_blocking(password).await?;
    store.update_password(rec.id, &hash).await
}

pub async fn set_active(store: &dyn CredentialStore, username: &str, is_active: bool) -> Result<()> {
    let rec = store
        .find_by_username(username)
        .await?
        .ok_or_else(|| anyhow!("user '{}' not found", username))?;
    store.set_active(rec.id, is_active).await
}

/// Seed the demo trainer and client into an empty store.
pub async fn ensure_demo_users(store: &dyn CredentialStore) -> Result<()> {
    if !store.list().await?.is_empty() {
        return Ok(());
    }
    add_user(store, "trainer1", DEMO_PASSWORD, Role::Trainer, Some("Entrenador Demo".into())).await?;
    add_user(store, "client1", DEMO_PASSWORD, Role::Client, Some("Cliente Demo".into())).await?;
    info!(target: "startup", "seeded demo accounts trainer1 and client1");
    Ok(())
}
