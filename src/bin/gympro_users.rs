//!
//! gympro user maintenance
//! -----------------------
//! Adds users, resets passwords and toggles accounts in the JSON user table.
//! Passwords are always stored hashed.
//!
//! Usage:
//!   gympro_users [--db <dir>] add <username> <password> [--role trainer|client|admin] [--name "Full Name"]
//!   gympro_users [--db <dir>] passwd <username> <password>
//!   gympro_users [--db <dir>] disable <username>
//!   gympro_users [--db <dir>] enable <username>
//!   gympro_users [--db <dir>] list

use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;

use gympro::config::ServerConfig;
use gympro::identity::Role;
use gympro::security::{self, classify, StoredPassword};
use gympro::storage::{CredentialStore, FileCredentialStore};

fn take_flag(args: &mut Vec<String>, flag: &str) -> Result<Option<String>> {
    let Some(i) = args.iter().position(|a| a == flag) else { return Ok(None) };
    if i + 1 >= args.len() {
        bail!("{} needs a value", flag);
    }
    let v = args.remove(i + 1);
    args.remove(i);
    Ok(Some(v))
}

fn positional(args: &[String], idx: usize, what: &str) -> Result<String> {
    args.get(idx).cloned().ok_or_else(|| anyhow!("missing {}", what))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new("warn")?)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let db = take_flag(&mut args, "--db")?
        .map(PathBuf::from)
        .unwrap_or_else(|| ServerConfig::from_env().db_folder);
    let role = take_flag(&mut args, "--role")?;
    let name = take_flag(&mut args, "--name")?;

    let store = FileCredentialStore::open(db.join("users.json"))?;
    let cmd = positional(&args, 0, "command (add|passwd|disable|enable|list)")?;
    match cmd.as_str() {
        "add" => {
            let username = positional(&args, 1, "username")?;
            let password = positional(&args, 2, "password")?;
            let role = role.as_deref().unwrap_or("client").parse::<Role>()?;
            let rec = security::add_user(&store, &username, &password, role, name).await?;
            println!("added {} (id={}, role={})", rec.username, rec.id, rec.role);
        }
        "passwd" => {
            let username = positional(&args, 1, "username")?;
            let password = positional(&args, 2, "password")?;
            security::change_password(&store, &username, &password).await?;
            println!("password updated for {}", username);
        }
        "disable" | "enable" => {
            let username = positional(&args, 1, "username")?;
            security::set_active(&store, &username, cmd == "enable").await?;
            println!("{} {}d", username, cmd);
        }
        "list" => {
            for r in store.list().await? {
                let storage = match classify(&r.password) {
                    StoredPassword::Bcrypt => "bcrypt",
                    StoredPassword::Argon2 => "argon2",
                    StoredPassword::Plaintext => "LEGACY-PLAINTEXT",
                };
                println!(
                    "{:>4}  {:<20} {:<8} active={:<5} {:<17} {}",
                    r.id,
                    r.username,
                    r.role.as_str(),
                    r.is_active,
                    storage,
                    r.full_name.unwrap_or_default()
                );
            }
        }
        other => bail!("unknown command '{}'", other),
    }
    Ok(())
}
