// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Environment variable naming a config file to use when `--config` is not
/// given.
pub const CONFIG_ENV_VAR: &str = "PROCPIPE_CONFIG";

/// Read and deserialize a config file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Read, deserialize and validate a config file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    debug!(path = %path.as_ref().display(), "loaded config");
    Ok(config)
}

/// Load `path` if given, else the file named by `PROCPIPE_CONFIG`, else
/// `procpipe.toml` if it exists; fall back to defaults when there is none.
///
/// An explicitly requested file that is missing is an error.
pub fn load_or_default(path: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = path {
        return load_and_validate(path);
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return load_and_validate(PathBuf::from(path));
    }
    let fallback = default_config_path();
    if fallback.is_file() {
        return load_and_validate(fallback);
    }
    Ok(ConfigFile::default())
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("procpipe.toml")
}
