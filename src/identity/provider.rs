use serde::Deserialize;
use tracing::{error, info, warn};

use super::cookies::SessionCookies;
use super::principal::LOGIN_PATH;
use super::session::{SessionCodec, SESSION_TTL};
use crate::config::ServerConfig;
use crate::error::{LoginError, LoginResult};
use crate::security::CredentialVerifier;
use crate::storage::SharedCredentialStore;

/// Login input shared by the form action and the JSON endpoint. Missing
/// fields deserialize as empty strings and are rejected by validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Verify credentials, issue the session cookie, pick the landing page.
#[derive(Clone)]
pub struct LoginFlow {
    verifier: CredentialVerifier,
    codec: SessionCodec,
}

impl LoginFlow {
    pub fn new(store: SharedCredentialStore, config: &ServerConfig) -> Self {
        let verifier = CredentialVerifier::new(store, config.login_timeout)
            .with_rehash_legacy(config.rehash_legacy);
        Self { verifier, codec: SessionCodec }
    }

    /// On success the session cookie is queued on `cookies` and the redirect
    /// target is returned. On failure nothing is written.
    pub async fn login(&self, req: &LoginRequest, cookies: &mut SessionCookies) -> LoginResult<&'static str> {
        if req.username.is_empty() || req.password.is_empty() {
            return Err(LoginError::Validation);
        }
        let identity = match self.verifier.verify(&req.username, &req.password).await {
            Ok(id) => id,
            Err(e) => {
                match &e {
                    LoginError::BackingStoreFault(_) => error!(target: "auth", user = %req.username, "login error: {}", e),
                    LoginError::BackingStoreTimeout(_) => warn!(target: "auth", user = %req.username, "login error: {}", e),
                    _ => info!(target: "auth", user = %req.username, code = e.code_str(), "login rejected"),
                }
                return Err(e);
            }
        };
        let token = self.codec.encode(&identity);
        cookies.set(&token, SESSION_TTL);
        info!(target: "auth", user = %identity.username, id = identity.id, role = %identity.role, "login ok");
        Ok(identity.role.home())
    }

    /// Drops the cookie. A copy of the old cookie stays valid until it expires.
    pub fn logout(&self, cookies: &mut SessionCookies) -> &'static str {
        cookies.clear();
        LOGIN_PATH
    }
}
