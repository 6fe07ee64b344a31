//! Servers: the legacy view of a configured endpoint.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{GlobalServer, PluginDiscovery, ServerType};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Server {
    pub name: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub server_type: Option<ServerType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub management_cluster_opts: Option<ManagementClusterServer>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_opts: Option<GlobalServer>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub discovery_sources: Vec<PluginDiscovery>,
}

/// Management cluster connection for `managementcluster` servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ManagementClusterServer {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub endpoint: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub context: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl Server {
    pub fn is_management_cluster(&self) -> bool {
        self.server_type == Some(ServerType::ManagementCluster)
    }

    pub fn is_global(&self) -> bool {
        self.server_type == Some(ServerType::Global)
    }
}
