// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_from_str(&contents)
}

/// Deserialize a raw configuration from TOML text.
pub fn load_from_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks category names, colours, groups and scheduler timings.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::try_from(raw_config)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("Rosterboard.toml")
}
