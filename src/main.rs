use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use muto::config::ServerConfig;
use muto::core::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("Invalid configuration")?;

    // RUST_LOG wins over MUTO_LOG
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false)
        .with_ansi(true)
        .with_writer(std::io::stdout)
        .compact()
        .init();

    info!("=== muto starting ===");

    tokio::fs::create_dir_all(&config.storage_dir)
        .await
        .with_context(|| format!("Cannot create storage directory {}", config.storage_dir.display()))?;

    let state = AppState::new(config);
    muto::server::serve(state).await.context("Server failed")?;

    info!("muto stopped");
    Ok(())
}
