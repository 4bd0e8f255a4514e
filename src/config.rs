//! Run configuration, read from a TOML file.
//!
//! Section and key names follow `micropython.ini`. Unlike INI, string values
//! must be quoted (`webpage = "https://..."`); booleans stay bare.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{FetchError, Result};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "fwfetch.toml";

/// Environment variable overriding [`DEFAULT_CONFIG_FILE`].
pub const CONFIG_ENV: &str = "FWFETCH_CONFIG";

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// URL of the directory listing page.
    pub webpage: String,
    /// Base URL individual files are fetched from.
    pub downloadpage: String,
}

/// `[local]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocalConfig {
    pub targetfolder: PathBuf,
}

/// How the listing page is turned into filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    /// Scan the raw page text.
    #[default]
    Pattern,
    /// Read the text of `<a>` elements.
    Anchor,
}

/// `[options]` section. The whole section may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OptionsConfig {
    #[serde(default)]
    pub include_unstable: bool,
    #[serde(default)]
    pub listing: ListingKind,
}

/// Configuration for one run, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub local: LocalConfig,
    #[serde(default)]
    pub options: OptionsConfig,
}

impl Config {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| FetchError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml(&text)?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(cfg)
    }
}

/// Resolve the config path: `$FWFETCH_CONFIG` if set and non-empty,
/// otherwise `fwfetch.toml`.
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
