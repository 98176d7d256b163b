//!
//! gympro server configuration
//! ---------------------------
//! Settings are read from `GYMPRO_*` environment variables, falling back to
//! defaults that suit local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_LOGIN_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub http_port: u16,
    /// Directory holding `users.json`.
    pub db_folder: PathBuf,
    /// Sets the Secure attribute on the session cookie.
    pub production: bool,
    /// Upper bound on the credential lookup during login.
    pub login_timeout: Duration,
    /// Rewrite legacy plaintext passwords as hashes after a successful login.
    pub rehash_legacy: bool,
    /// Seed `trainer1` / `client1` into an empty store.
    pub seed_demo: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            http_port: DEFAULT_HTTP_PORT,
            db_folder: PathBuf::from("data"),
            production: false,
            login_timeout: Duration::from_millis(DEFAULT_LOGIN_TIMEOUT_MS),
            rehash_legacy: false,
            seed_demo: true,
        }
    }
}

pub fn parse_bool_env(name: &str) -> Option<bool> {
    match env::var(name) {
        Ok(v) => parse_bool(&v),
        Err(_) => None,
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        let production = env::var("GYMPRO_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(d.production);
        Self {
            bind: env::var("GYMPRO_BIND").unwrap_or(d.bind),
            http_port: parse_env("GYMPRO_HTTP_PORT").unwrap_or(d.http_port),
            db_folder: env::var("GYMPRO_DB_FOLDER").map(PathBuf::from).unwrap_or(d.db_folder),
            production,
            login_timeout: parse_env::<u64>("GYMPRO_LOGIN_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(d.login_timeout),
            rehash_legacy: parse_bool_env("GYMPRO_REHASH_LEGACY").unwrap_or(d.rehash_legacy),
            seed_demo: parse_bool_env("GYMPRO_SEED_DEMO").unwrap_or(d.seed_demo),
        }
    }

    pub fn users_file(&self) -> PathBuf {
        self.db_folder.join("users.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool(" on "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn defaults_match_documented_values() {
        let c = ServerConfig::default();
        assert_eq!(c.http_port, 3000);
        assert_eq!(c.login_timeout, Duration::from_secs(10));
        assert!(!c.production);
        assert!(!c.rehash_legacy);
        assert_eq!(c.users_file(), PathBuf::from("data").join("users.json"));
    }
}
