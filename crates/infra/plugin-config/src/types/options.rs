//! Client-wide options: CLI settings, features, env, telemetry, certs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::PluginDiscovery;

/// Flags of one plugin, keyed by feature name. Values are strings ("true").
pub type FeatureMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli: Option<CliOptions>,

    /// Plugin name -> feature flags.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, FeatureMap>,

    /// Environment variables injected into plugin processes.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CliOptions {
    /// Discovery sources not tied to any context.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub discovery_sources: Vec<PluginDiscovery>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub edition: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub bom_repo: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub compatibility_file_path: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub unstable_version_selector: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<TelemetryOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct TelemetryOptions {
    /// Where telemetry events are written.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub ceip_opt_in: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub entitlement_account: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub csp_org_id: String,
}

/// TLS settings for one host. Identity is `host`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Cert {
    pub host: String,

    /// Base64 encoded CA bundle.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ca_cert_data: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub skip_cert_verify: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub insecure: String,
}
