//! The config store: locked load, patch and persist cycles per entity.
//!
//! Every mutating operation follows one template:
//!
//! 1. validate identity fields (no lock, no I/O)
//! 2. acquire the [`ConfigLock`]
//! 3. load both documents and the patch strategies
//! 4. locate or create the target subtree and patch it
//! 5. persist only if something changed, then release the lock
//!
//! Read operations load the documents without taking the lock. A concurrent
//! writer may commit between a read and whatever the caller does with it.

mod certs;
mod contexts;
mod discovery;
mod metadata;
mod options;
mod servers;
pub(crate) mod tree;

pub use metadata::ConfigMetadata;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::active_resource::{ActiveResourceSync, CliActiveResourceSync};
use crate::error::{ConfigError, Result};
use crate::locks::{ConfigLock, DEFAULT_LOCK_TIMEOUT, LockGuard};
use crate::node::{Key, Node, path_string, yaml};
use crate::paths::{ConfigPaths, lock_timeout_from_env};
use crate::patch::PatchStrategies;
use crate::types::ClientConfig;
use tree::ConfigTree;

/// Handle to the config files. Cheap to clone; clones share one lock.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    paths: ConfigPaths,
    lock: Arc<ConfigLock>,
    sync: Arc<dyn ActiveResourceSync>,
}

#[derive(Debug, Default)]
pub struct ConfigStoreBuilder {
    paths: Option<ConfigPaths>,
    lock_timeout: Option<Duration>,
    sync: Option<Arc<dyn ActiveResourceSync>>,
}

impl ConfigStoreBuilder {
    #[must_use]
    pub fn paths(mut self, paths: ConfigPaths) -> Self {
        self.paths = Some(paths);
        self
    }

    /// All files inside `dir`, with the default file names.
    #[must_use]
    pub fn config_dir(self, dir: impl AsRef<Path>) -> Self {
        self.paths(ConfigPaths::in_dir(dir))
    }

    #[must_use]
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn active_resource_sync(mut self, sync: Arc<dyn ActiveResourceSync>) -> Self {
        self.sync = Some(sync);
        self
    }

    /// Paths default to the environment, the timeout to
    /// `PLUGIN_CONFIG_LOCK_TIMEOUT_SECS` and then ten minutes.
    pub fn build(self) -> Result<ConfigStore> {
        let paths = match self.paths {
            Some(paths) => paths,
            None => ConfigPaths::from_env()?,
        };
        let timeout = self
            .lock_timeout
            .or_else(lock_timeout_from_env)
            .unwrap_or(DEFAULT_LOCK_TIMEOUT);
        let sync = self
            .sync
            .unwrap_or_else(|| Arc::new(CliActiveResourceSync::default()));

        tracing::debug!(
            "config store: main={} next_gen={} timeout={}s",
            paths.main.display(),
            paths.next_gen.display(),
            timeout.as_secs()
        );
        Ok(ConfigStore {
            lock: Arc::new(ConfigLock::new(&paths, timeout)),
            paths,
            sync,
        })
    }
}

impl ConfigStore {
    pub fn builder() -> ConfigStoreBuilder {
        ConfigStoreBuilder::default()
    }

    /// Store over the files named by the environment (or their defaults).
    pub fn from_env() -> Result<Self> {
        Self::builder().build()
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Take the write lock directly, e.g. to hold it across external work.
    pub fn acquire_lock(&self) -> Result<LockGuard<'_>> {
        self.lock.acquire()
    }

    /// Typed snapshot of both documents merged into one.
    pub fn get_client_config(&self) -> Result<ClientConfig> {
        let tree = self.snapshot()?;
        decode(&tree.merged(), "client config")
    }

    /// Both documents as currently on disk. No lock is taken.
    pub(crate) fn snapshot(&self) -> Result<ConfigTree> {
        ConfigTree::load(&self.paths)
    }

    /// Run `op` under the lock and persist if it reports a change.
    pub(crate) fn update(
        &self,
        what: &str,
        op: impl FnOnce(&mut ConfigTree, &PatchStrategies) -> Result<bool>,
    ) -> Result<bool> {
        let guard = self.lock.acquire()?;
        let strategies = self.load_patch_strategies()?;
        let mut tree = ConfigTree::load(&self.paths)?;

        let changed = op(&mut tree, &strategies)?;
        if changed {
            tree.persist(&self.paths, &guard)?;
            tracing::info!("updated {what}");
        } else {
            tracing::debug!("{what} unchanged; skipping write");
        }
        Ok(changed)
    }

    /// Run a delete under the lock. `op` reports whether anything matched;
    /// a match is always persisted, no match is `NotFound`.
    pub(crate) fn delete(
        &self,
        entity: &'static str,
        name: &str,
        op: impl FnOnce(&mut ConfigTree) -> Result<bool>,
    ) -> Result<()> {
        let guard = self.lock.acquire()?;
        let mut tree = ConfigTree::load(&self.paths)?;
        if !op(&mut tree)? {
            return Err(ConfigError::not_found(entity, name));
        }
        tree.persist(&self.paths, &guard)?;
        tracing::info!("deleted {entity} '{name}'");
        Ok(())
    }
}

pub(crate) fn require(value: &str, entity: &'static str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation { entity, field });
    }
    Ok(())
}

pub(crate) fn encode<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<Node> {
    yaml::from_typed(value).map_err(|e| ConfigError::serialization(what, e))
}

pub(crate) fn decode<T: DeserializeOwned>(node: &Node, what: &str) -> Result<T> {
    yaml::to_typed(node).map_err(|e| ConfigError::serialization(what, e))
}

/// Locate `path`, creating it if needed. A miss means the tree is malformed.
pub(crate) fn force_find<'a>(tree: &'a mut ConfigTree, path: &[Key]) -> Result<&'a mut Node> {
    tree.find_mut(path, true)
        .ok_or_else(|| ConfigError::NodeNotFound {
            path: path_string(path),
        })
}

/// Same as [`force_find`] on a bare root mapping.
pub(crate) fn force_find_in<'a>(root: &'a mut Node, path: &[Key]) -> Result<&'a mut Node> {
    crate::node::find_mut(root, path, true).ok_or_else(|| ConfigError::NodeNotFound {
        path: path_string(path),
    })
}

/// Set a string value under `key` of a mapping. Scalars compare by text, so
/// an unquoted `true` already on disk equals a new `"true"`.
pub(crate) fn set_scalar(parent: &mut Node, key: &str, value: &str) -> bool {
    if parent.get(key).and_then(Node::as_str) == Some(value) {
        return false;
    }
    parent.insert(key, Node::string(value));
    true
}

/// Decode every element of a sequence, in order.
pub(crate) fn decode_all<T: DeserializeOwned>(seq: Option<&Node>, what: &str) -> Result<Vec<T>> {
    seq.filter(|s| s.is_sequence())
        .map(|s| s.children.iter().map(|e| decode(e, what)).collect())
        .unwrap_or_else(|| Ok(Vec::new()))
}
