use std::path::PathBuf;
use thiserror::Error;

use crate::patch::PatchError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{entity} {field} must not be empty")]
    Validation {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{entity} '{name}' not found")]
    NotFound { entity: &'static str, name: String },

    #[error("no current {what} is set")]
    NoCurrent { what: String },

    #[error("config node not found at '{path}' after forced create")]
    NodeNotFound { path: String },

    #[error("timed out after {timeout_secs}s waiting for config lock {path}")]
    LockTimeout { path: PathBuf, timeout_secs: u64 },

    #[error("failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to convert {what}: {source}")]
    Serialization {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config root must be a mapping: {path}")]
    InvalidDocument { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("context '{name}' has type {actual}, expected {expected}")]
    UnsupportedContextType {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("active resource update failed: {message}")]
    ActiveResource { message: String },
}

impl ConfigError {
    /// Lock failures leave the cross-process lock pair in an unknown state.
    /// Callers are expected to stop rather than retry or continue writing.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::LockTimeout { .. } | Self::Lock { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serialization(what: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::Serialization {
            what: what.into(),
            source,
        }
    }

    pub(crate) fn not_found(entity: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            name: name.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_errors_are_fatal() {
        let timeout = ConfigError::LockTimeout {
            path: PathBuf::from("/tmp/config.yaml.lock"),
            timeout_secs: 600,
        };
        assert!(timeout.is_fatal());
        assert!(timeout.to_string().contains("600s"));

        let io = ConfigError::Lock {
            path: PathBuf::from("/tmp/config.yaml.lock"),
            source: std::io::Error::other("boom"),
        };
        assert!(io.is_fatal());
    }

    #[test]
    fn test_recoverable_errors_are_not_fatal() {
        assert!(!ConfigError::not_found("context", "c1").is_fatal());
        assert!(
            !ConfigError::Validation {
                entity: "context",
                field: "name"
            }
            .is_fatal()
        );
        assert_eq!(
            ConfigError::not_found("server", "s1").to_string(),
            "server 's1' not found"
        );
    }
}
