//! Config file locations.
//!
//! Resolution order for each file (highest wins):
//! 1. Environment variable naming the file path
//! 2. Default location under the OS config directory
//!
//! # Environment Variables
//! - `PLUGIN_CONFIG`: primary config file
//! - `PLUGIN_CONFIG_NEXT_GEN`: secondary ("next-gen") config file
//! - `PLUGIN_CONFIG_METADATA`: metadata file holding patch strategies
//! - `PLUGIN_CONFIG_LOCK_TIMEOUT_SECS`: override for the lock wait

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

pub const CONFIG_ENV: &str = "PLUGIN_CONFIG";
pub const CONFIG_NEXT_GEN_ENV: &str = "PLUGIN_CONFIG_NEXT_GEN";
pub const CONFIG_METADATA_ENV: &str = "PLUGIN_CONFIG_METADATA";
pub const LOCK_TIMEOUT_ENV: &str = "PLUGIN_CONFIG_LOCK_TIMEOUT_SECS";

/// Directory name under `config_dir` holding all config files.
pub const CONFIG_DIR: &str = "plugin-config";
pub const CONFIG_FILE: &str = "config.yaml";
pub const CONFIG_NEXT_GEN_FILE: &str = "config-ng.yaml";
pub const CONFIG_METADATA_FILE: &str = ".config-metadata.yaml";

/// Resolved paths for the files the store reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Primary (legacy) config document.
    pub main: PathBuf,

    /// Secondary document holding contexts and current-context pointers.
    pub next_gen: PathBuf,

    /// Metadata document (patch strategies, settings).
    pub metadata: PathBuf,
}

impl ConfigPaths {
    /// All three files inside one directory, using the default file names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            main: dir.join(CONFIG_FILE),
            next_gen: dir.join(CONFIG_NEXT_GEN_FILE),
            metadata: dir.join(CONFIG_METADATA_FILE),
        }
    }

    /// Resolve paths from the environment, falling back to the OS config dir.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::in_dir(default_config_dir()?);
        Ok(Self {
            main: env_path(CONFIG_ENV).unwrap_or(defaults.main),
            next_gen: env_path(CONFIG_NEXT_GEN_ENV).unwrap_or(defaults.next_gen),
            metadata: env_path(CONFIG_METADATA_ENV).unwrap_or(defaults.metadata),
        })
    }

    /// Advisory lock file guarding the primary document.
    pub fn main_lock(&self) -> PathBuf {
        lock_path_for(&self.main)
    }

    /// Advisory lock file guarding the secondary document.
    pub fn next_gen_lock(&self) -> PathBuf {
        lock_path_for(&self.next_gen)
    }
}

/// `~/.config/plugin-config` on Linux, the platform equivalent elsewhere.
pub fn default_config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| {
        ConfigError::io(
            CONFIG_DIR,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine OS config directory",
            ),
        )
    })?;
    Ok(base.join(CONFIG_DIR))
}

/// Lock timeout from `PLUGIN_CONFIG_LOCK_TIMEOUT_SECS`, if set and valid.
pub fn lock_timeout_from_env() -> Option<Duration> {
    let raw = env_trimmed(LOCK_TIMEOUT_ENV)?;
    match raw.parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            tracing::warn!("ignoring invalid {LOCK_TIMEOUT_ENV} value: {raw}");
            None
        }
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    path.with_file_name(format!("{name}.lock"))
}

fn env_path(name: &str) -> Option<PathBuf> {
    env_trimmed(name).map(PathBuf::from)
}

/// Read an env var, trimmed, treating empty values as unset.
fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
