//! Config directory for the gm tools
//!
//! gm reads two files: the OAuth client credentials downloaded from the
//! Google Cloud Console and the token file written by whatever tool ran the
//! consent flow. Both live in one directory, `~/.config/gm/` unless
//! `GM_CONFIG_DIR` points elsewhere. Nothing here writes tokens back.
//!
//! Call [`init`] at application startup to bootstrap the config directory.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config directory
pub const DIR_ENV: &str = "GM_CONFIG_DIR";

/// Name of the directory under the platform config dir
const APP_DIR: &str = "gm";

/// The files gm keeps in its config directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFile {
    /// OAuth client credentials (Google Cloud Console JSON)
    Credentials,
    /// Stored access token (googleapis token JSON)
    Token,
}

impl ConfigFile {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Credentials => "credentials.json",
            Self::Token => "token.json",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Credentials => "credentials",
            Self::Token => "token",
        }
    }

    /// Location of this file in the config directory
    pub fn path(self) -> Option<PathBuf> {
        config_dir().map(|dir| self.path_in(&dir))
    }

    /// Location of this file under `dir`
    pub fn path_in(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    pub fn exists(self) -> bool {
        self.path().is_some_and(|p| p.is_file())
    }

    /// Read and parse this file from the config directory
    pub fn load<T: DeserializeOwned>(self) -> Result<T> {
        let dir = config_dir().context("Could not determine config directory")?;
        self.load_from(&dir)
    }

    /// Read and parse this file from `dir`
    pub fn load_from<T: DeserializeOwned>(self, dir: &Path) -> Result<T> {
        read_json(&self.path_in(dir))
            .with_context(|| format!("Failed to load gm {} file", self.describe()))
    }
}

/// Initialize the config directory.
///
/// Creates the directory if it doesn't exist and returns its path.
pub fn init() -> Result<PathBuf> {
    let dir = config_dir().context("Could not determine config directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    Ok(dir)
}

/// The config directory: `$GM_CONFIG_DIR` if set, else `~/.config/gm/`
pub fn config_dir() -> Option<PathBuf> {
    resolve_dir(std::env::var_os(DIR_ENV))
}

/// Pick the config directory given the value of the override variable.
/// An empty override counts as unset.
pub fn resolve_dir(override_dir: Option<OsString>) -> Option<PathBuf> {
    match override_dir {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|p| p.join(APP_DIR)),
    }
}

/// Read and parse a JSON file at an explicit path
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}
