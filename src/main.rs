use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

use gympro::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env();
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "startup",
        "GymPro starting: RUST_LOG='{}', bind={}, http_port={}, db_folder='{}', production={}, login_timeout_ms={}, rehash_legacy={}, seed_demo={}",
        rust_log,
        config.bind,
        config.http_port,
        config.db_folder.display(),
        config.production,
        config.login_timeout.as_millis(),
        config.rehash_legacy,
        config.seed_demo
    );

    gympro::server::run(config).await
}
