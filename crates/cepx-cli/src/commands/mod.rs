//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod finalize;
pub mod parse;
pub mod process;

use std::path::{Path, PathBuf};

use cepx_core::models::config::CepxConfig;
use tracing::debug;

/// Location of the user configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cepx")
        .join("config.json")
}

/// Load the configuration: the `--config` file when given, else the user
/// file when it exists, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<CepxConfig> {
    if let Some(path) = config_path {
        return Ok(CepxConfig::from_file(Path::new(path))?);
    }

    load_config_or_default(&default_config_path())
}

/// The configuration at `path`, or defaults when no file is there yet.
pub fn load_config_or_default(path: &Path) -> anyhow::Result<CepxConfig> {
    if path.exists() {
        debug!("Using configuration from {}", path.display());
        Ok(CepxConfig::from_file(path)?)
    } else {
        Ok(CepxConfig::default())
    }
}
