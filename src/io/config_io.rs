use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Name of the directory that marks a slate store
pub const STORE_DIR: &str = ".slate";

const CONFIG_FILE: &str = "config.toml";

/// Error type for store discovery and config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no .slate/ directory found here or in any parent (run `slate init`)")]
    NotFound,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Walk up from `start` looking for a `.slate/` directory.
/// Returns the path of the `.slate/` directory itself.
pub fn discover_store_dir(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(STORE_DIR);
        if candidate.is_dir() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(ConfigError::NotFound);
        }
    }
}

/// Load `config.toml` from the store directory. A missing file yields
/// the defaults.
pub fn read_config(store_dir: &Path) -> Result<Config, ConfigError> {
    let path = store_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError { path, source: e })
}

pub fn config_path(store_dir: &Path) -> PathBuf {
    store_dir.join(CONFIG_FILE)
}
