//! `assetregd`: the fixed-asset register server.
//!
//! Usage:
//!   assetregd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/assetreg/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use assetreg_core::Module;
use assetreg_sql::{SQLStore, SqliteStore};
use clap::Parser;
use fixed_asset::service::FixedAssetService;
use fixed_asset::FixedAssetModule;
use tracing::info;

use config::ServerConfig;

/// Fixed-asset register server.
#[derive(Parser, Debug)]
#[command(name = "assetregd", about = "Fixed-asset register server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    // Verify configuration is valid.
    bootstrap::verify_config(&server_config)?;

    // Initialize storage.
    let core_config = server_config.storage.service_config(&cli.listen);
    let sqlite_path = core_config.resolve_sqlite_path();
    if let Some(dir) = sqlite_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let sql: Arc<dyn SQLStore> = Arc::new(
        SqliteStore::open(&sqlite_path)
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );
    info!("SQL store opened at {}", sqlite_path.display());

    let service = FixedAssetService::new(Arc::clone(&sql), server_config.codes.max_attempts)
        .map_err(|e| anyhow::anyhow!("failed to initialize fixed asset service: {}", e))?;
    bootstrap::seed_reference_data(&service, &server_config)?;

    let asset_module = FixedAssetModule::new(service);
    info!("{} module initialized", asset_module.name());

    let app = routes::build_router(vec![(asset_module.name(), asset_module.routes())]);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("assetregd listening on {}", core_config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
