//! Plugin discovery sources.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ContextType;

/// Where plugins are discovered from. Exactly one variant is populated; the
/// YAML form is `{<variant>: {name: ..., ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum DiscoverySource {
    Oci(OciDiscovery),
    Local(LocalDiscovery),
    Gcp(GcpDiscovery),
    Kubernetes(KubernetesDiscovery),
    Rest(RestDiscovery),
}

impl DiscoverySource {
    /// Identity of the source, independent of its variant.
    pub fn name(&self) -> &str {
        match self {
            Self::Oci(s) => &s.name,
            Self::Local(s) => &s.name,
            Self::Gcp(s) => &s.name,
            Self::Kubernetes(s) => &s.name,
            Self::Rest(s) => &s.name,
        }
    }

    /// YAML key of the populated variant.
    pub fn variant(&self) -> &'static str {
        match self {
            Self::Oci(_) => "oci",
            Self::Local(_) => "local",
            Self::Gcp(_) => "gcp",
            Self::Kubernetes(_) => "kubernetes",
            Self::Rest(_) => "rest",
        }
    }
}

/// A discovery source as stored in the config document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PluginDiscovery {
    #[serde(flatten)]
    pub source: DiscoverySource,

    /// Deprecated context scoping kept for older readers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_type: Option<ContextType>,
}

impl PluginDiscovery {
    pub fn name(&self) -> &str {
        self.source.name()
    }
}

impl From<DiscoverySource> for PluginDiscovery {
    fn from(source: DiscoverySource) -> Self {
        Self {
            source,
            context_type: None,
        }
    }
}

/// OCI image based discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct OciDiscovery {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
}

/// Local filesystem discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalDiscovery {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
}

/// GCP bucket discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct GcpDiscovery {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub bucket: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub manifest_path: String,
}

/// In-cluster discovery through a kubeconfig.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct KubernetesDiscovery {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub context: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// REST endpoint discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RestDiscovery {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub base_path: String,
}
