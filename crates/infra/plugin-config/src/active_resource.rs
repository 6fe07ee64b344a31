//! Active project/space/cluster-group of a tanzu context.
//!
//! The active resource is stored in the context's `additionalMetadata`. After
//! the store has persisted it (and released the config lock) an external CLI
//! is asked to bring its own state in line, through [`ActiveResourceSync`].

use serde_json::Value;
use std::collections::BTreeMap;
use std::process::{Command, Stdio};

use crate::error::{ConfigError, Result};
use crate::types::Context;

pub const PROJECT_NAME_KEY: &str = "tanzuProjectName";
pub const PROJECT_ID_KEY: &str = "tanzuProjectID";
pub const SPACE_NAME_KEY: &str = "tanzuSpaceName";
pub const CLUSTER_GROUP_NAME_KEY: &str = "tanzuClusterGroupName";

/// Binary invoked by [`CliActiveResourceSync`] unless overridden.
pub const DEFAULT_SYNC_BINARY: &str = "tanzu";

/// Resource to make active. Empty fields clear the corresponding key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveResource {
    pub project_name: String,
    pub project_id: String,
    pub space_name: String,
    pub cluster_group_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveResourceOptions {
    /// Update the config only; do not run the external CLI.
    pub skip_sync: bool,
}

impl ActiveResource {
    /// A space and a cluster group live inside a project and exclude each other.
    pub fn validate(&self) -> Result<()> {
        if !self.space_name.is_empty() && !self.cluster_group_name.is_empty() {
            return Err(ConfigError::ActiveResource {
                message: "a space and a cluster group cannot both be active".into(),
            });
        }
        if self.project_name.is_empty()
            && (!self.space_name.is_empty() || !self.cluster_group_name.is_empty())
        {
            return Err(ConfigError::ActiveResource {
                message: "a project is required to activate a space or cluster group".into(),
            });
        }
        Ok(())
    }

    /// Write this resource into an additional-metadata map.
    pub fn apply_to(&self, metadata: &mut BTreeMap<String, Value>) {
        for (key, value) in [
            (PROJECT_NAME_KEY, &self.project_name),
            (PROJECT_ID_KEY, &self.project_id),
            (SPACE_NAME_KEY, &self.space_name),
            (CLUSTER_GROUP_NAME_KEY, &self.cluster_group_name),
        ] {
            if value.is_empty() {
                metadata.remove(key);
            } else {
                metadata.insert(key.to_string(), Value::String(value.clone()));
            }
        }
    }

    /// Read the active resource recorded on `context`.
    pub fn from_context(context: &Context) -> Self {
        let read = |key: &str| {
            context
                .additional_metadata
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            project_name: read(PROJECT_NAME_KEY),
            project_id: read(PROJECT_ID_KEY),
            space_name: read(SPACE_NAME_KEY),
            cluster_group_name: read(CLUSTER_GROUP_NAME_KEY),
        }
    }
}

/// Propagates a changed active resource outside the config files.
///
/// Called without the config lock held: implementations may themselves run
/// processes that use the store.
pub trait ActiveResourceSync: Send + Sync + std::fmt::Debug {
    fn sync(&self, context: &Context, resource: &ActiveResource) -> Result<()>;
}

/// Runs `<binary> context update tanzu-active-resource <name> ...`.
#[derive(Debug, Clone)]
pub struct CliActiveResourceSync {
    binary: String,
}

impl Default for CliActiveResourceSync {
    fn default() -> Self {
        Self::new(DEFAULT_SYNC_BINARY)
    }
}

impl CliActiveResourceSync {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn build_command(&self, context: &Context, resource: &ActiveResource) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("context")
            .arg("update")
            .arg("tanzu-active-resource")
            .arg(&context.name)
            .arg("--project")
            .arg(&resource.project_name)
            .arg("--project-id")
            .arg(&resource.project_id);
        if !resource.space_name.is_empty() {
            cmd.arg("--space").arg(&resource.space_name);
        }
        if !resource.cluster_group_name.is_empty() {
            cmd.arg("--clustergroup").arg(&resource.cluster_group_name);
        }
        cmd
    }
}

impl ActiveResourceSync for CliActiveResourceSync {
    fn sync(&self, context: &Context, resource: &ActiveResource) -> Result<()> {
        which::which(&self.binary).map_err(|e| ConfigError::ActiveResource {
            message: format!("{} executable not found in PATH: {e}", self.binary),
        })?;

        let output = self
            .build_command(context, resource)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ConfigError::io(&self.binary, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConfigError::ActiveResource {
                message: format!(
                    "{} exited with {:?}: {}",
                    self.binary,
                    output.status.code(),
                    stderr.trim()
                ),
            });
        }
        tracing::info!("synced active resource of context '{}'", context.name);
        Ok(())
    }
}

/// Does nothing. For embedders that keep no state outside the config.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopActiveResourceSync;

impl ActiveResourceSync for NoopActiveResourceSync {
    fn sync(&self, _context: &Context, _resource: &ActiveResource) -> Result<()> {
        Ok(())
    }
}
