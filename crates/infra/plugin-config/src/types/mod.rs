//! Typed entities stored in the config documents.
//!
//! All entities serialize with camelCase keys and skip empty fields, so a
//! typed value only mentions what it sets and a patch never blanks out
//! fields the caller did not touch.

mod context;
mod discovery;
mod kinds;
mod options;
mod server;

pub use context::{ClusterServer, Context, GlobalServer, GlobalServerAuth};
pub use discovery::{
    DiscoverySource, GcpDiscovery, KubernetesDiscovery, LocalDiscovery, OciDiscovery,
    PluginDiscovery, RestDiscovery,
};
pub use kinds::{ContextType, ServerType, Target};
pub use options::{Cert, CliOptions, ClientOptions, FeatureMap, TelemetryOptions};
pub use server::{ManagementClusterServer, Server};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The merged logical document spanning both config files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub kind: String,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,

    /// Legacy server records.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    /// Legacy current server name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub current: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<Context>,

    /// Context type -> current context name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub current_context: BTreeMap<ContextType, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_options: Option<ClientOptions>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub certs: Vec<Cert>,
}

impl ClientConfig {
    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == name)
    }

    pub fn server(&self, name: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.name == name)
    }

    pub fn current_context_name(&self, context_type: &ContextType) -> Option<&str> {
        self.current_context
            .get(context_type)
            .map(String::as_str)
            .filter(|n| !n.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_document_round_trip() {
        let yaml = r"
apiVersion: config.plugins.dev/v1alpha1
kind: ClientConfig
servers:
- name: mc
  type: managementcluster
  managementClusterOpts:
    path: /kube
    context: admin@mc
current: mc
contexts:
- name: mc
  target: kubernetes
  contextType: kubernetes
  clusterOpts:
    path: /kube
    context: admin@mc
    isManagementCluster: true
currentContext:
  kubernetes: mc
certs:
- host: registry.local
  insecure: 'true'
";
        let cfg: ClientConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.current, "mc");
        assert_eq!(
            cfg.current_context_name(&ContextType::Kubernetes),
            Some("mc")
        );
        assert!(cfg.context("mc").unwrap().cluster_opts.as_ref().unwrap().is_management_cluster);
        assert!(cfg.server("mc").unwrap().is_management_cluster());

        let again: ClientConfig =
            serde_yaml::from_str(&serde_yaml::to_string(&cfg).unwrap()).unwrap();
        assert_eq!(again, cfg);
    }
}
