use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TRAINER_HOME: &str = "/trainer";
pub const CLIENT_HOME: &str = "/client";
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Trainer,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Trainer => "trainer",
            Role::Client => "client",
        }
    }

    /// Landing area after login. Admins share the trainer area.
    pub fn home(&self) -> &'static str {
        match self {
            Role::Client => CLIENT_HOME,
            Role::Admin | Role::Trainer => TRAINER_HOME,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "trainer" => Ok(Role::Trainer),
            "client" => Ok(Role::Client),
            other => Err(anyhow::anyhow!("unknown role '{}'", other)),
        }
    }
}

/// Point-in-time snapshot of a user carried inside the session cookie.
/// It is never re-checked against the store after issuance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub full_name: Option<String>,
    pub is_active: bool,
}

impl Identity {
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(n) if !n.trim().is_empty() => n,
            _ => &self.username,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_lands_in_trainer_area() {
        assert_eq!(Role::Admin.home(), "/trainer");
        assert_eq!(Role::Trainer.home(), "/trainer");
        assert_eq!(Role::Client.home(), "/client");
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!("Trainer".parse::<Role>().unwrap(), Role::Trainer);
        assert!("coach".parse::<Role>().is_err());
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let mut id = Identity { id: 1, username: "client1".into(), role: Role::Client, full_name: None, is_active: true };
        assert_eq!(id.display_name(), "client1");
        id.full_name = Some("  ".into());
        assert_eq!(id.display_name(), "client1");
        id.full_name = Some("Ana López".into());
        assert_eq!(id.display_name(), "Ana López");
    }
}
