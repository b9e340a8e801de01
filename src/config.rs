//! User configuration file
//!
//! `<config_dir>/polysearch/config.json` holds defaults for every search:
//!
//! ```json
//! { "records": "/data/colleges.json", "search": { "maxResults": 10, "strategies": ["fuzzy", "regex"] } }
//! ```

use crate::search::SearchOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Defaults applied before command-line or tool arguments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Records file used when a call names none
    pub records: Option<PathBuf>,
    /// Default search options
    pub search: SearchOptions,
}

/// Get the path to the default configuration file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
    Ok(config_dir.join("polysearch").join("config.json"))
}

/// Load the configuration, from `path` when given, else from the default location.
/// A missing file yields the default configuration.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: Config = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    config
        .search
        .validate()
        .with_context(|| format!("Invalid search defaults in {}", path.display()))?;

    Ok(config)
}
