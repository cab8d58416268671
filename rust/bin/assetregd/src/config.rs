//! Server configuration, read from a TOML file.

use std::path::{Path, PathBuf};

use assetreg_core::ServiceConfig;
use fixed_asset::code::DEFAULT_MAX_ATTEMPTS;
use fixed_asset::model::{AssetTypeSeed, DepartmentSeed};
use serde::Deserialize;

/// Directory searched for bare context names.
const CONFIG_DIR: &str = "/etc/assetreg";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,

    #[serde(default)]
    pub codes: CodesConfig,

    /// Departments upserted at startup.
    #[serde(default)]
    pub departments: Vec<DepartmentSeed>,

    /// Asset types upserted at startup.
    #[serde(default)]
    pub asset_types: Vec<AssetTypeSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,

    /// SQLite database file. Defaults to `{data_dir}/data.sqlite`.
    #[serde(default)]
    pub sqlite_path: Option<String>,
}

impl StorageConfig {
    pub fn service_config(&self, listen: &str) -> ServiceConfig {
        ServiceConfig {
            data_dir: Some(PathBuf::from(&self.data_dir)),
            sqlite_path: self.sqlite_path.as_ref().map(PathBuf::from),
            listen: listen.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodesConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for CodesConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl ServerConfig {
    /// A value containing `/` or `.` is a path; anything else is a context
    /// name resolved to `/etc/assetreg/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONFIG_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
