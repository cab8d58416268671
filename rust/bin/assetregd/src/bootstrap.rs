//! Bootstrap: startup checks and reference data seeding.
//!
//! When assetregd starts:
//! 1. Verify the config is usable. If not, refuse to start.
//! 2. Upsert the configured departments and asset types.

use fixed_asset::service::FixedAssetService;
use tracing::info;

use crate::config::ServerConfig;

/// Verify server configuration before touching storage.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.storage.data_dir.trim().is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if config.codes.max_attempts < 1 {
        anyhow::bail!("codes.max_attempts must be at least 1.");
    }
    for dept in &config.departments {
        dept.validate()
            .map_err(|e| anyhow::anyhow!("invalid department seed: {}", e))?;
    }
    for ty in &config.asset_types {
        ty.validate()
            .map_err(|e| anyhow::anyhow!("invalid asset type seed: {}", e))?;
    }
    Ok(())
}

/// Upsert configured reference data.
pub fn seed_reference_data(
    svc: &FixedAssetService,
    config: &ServerConfig,
) -> anyhow::Result<()> {
    for dept in &config.departments {
        svc.upsert_department(dept)
            .map_err(|e| anyhow::anyhow!("failed to seed department '{}': {}", dept.code, e))?;
    }
    for ty in &config.asset_types {
        svc.upsert_asset_type(ty)
            .map_err(|e| anyhow::anyhow!("failed to seed asset type {}: {}", ty.code, e))?;
    }
    info!(
        departments = config.departments.len(),
        asset_types = config.asset_types.len(),
        "reference data seeded"
    );
    Ok(())
}
