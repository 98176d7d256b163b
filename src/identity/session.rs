use std::time::Duration;

use super::principal::Identity;

pub type SessionToken = String;

pub const SESSION_COOKIE: &str = "gym_session";
/// Fixed seven-day window; sessions are never renewed.
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// Serializes an Identity into the cookie value and back.
///
/// The token is the JSON form of the Identity, percent-encoded so it is a
/// valid cookie value. It carries no signature: integrity rests on the cookie
/// being HttpOnly and SameSite=Lax.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionCodec;

impl SessionCodec {
    pub fn encode(&self, identity: &Identity) -> SessionToken {
        // Serializing a plain struct of strings/ints/bools cannot fail.
        let json = serde_json::to_string(identity).unwrap_or_default();
        urlencoding::encode(&json).into_owned()
    }

    /// Returns `None` for anything that is not a well-formed Identity.
    pub fn decode(&self, token: &str) -> Option<Identity> {
        let json = urlencoding::decode(token).ok()?;
        serde_json::from_str::<Identity>(&json).ok()
    }
}
