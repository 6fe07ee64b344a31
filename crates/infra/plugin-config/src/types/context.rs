//! Contexts: the current-generation view of a configured endpoint.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ContextType, PluginDiscovery, Target};

/// A named endpoint the CLI can operate against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Context {
    /// Identity of the context; unique across all contexts.
    pub name: String,

    /// Legacy target; kept alongside `context_type` for older readers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_type: Option<ContextType>,

    /// Connection details for kubernetes and tanzu contexts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_opts: Option<ClusterServer>,

    /// Connection details for mission-control contexts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_opts: Option<GlobalServer>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub discovery_sources: Vec<PluginDiscovery>,

    /// Open map owned by whoever writes it; replaced wholesale on update.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_metadata: BTreeMap<String, serde_json::Value>,
}

impl Context {
    pub fn new(name: impl Into<String>, context_type: ContextType) -> Self {
        Self {
            name: name.into(),
            target: Some(Target::for_context_type(&context_type)),
            context_type: Some(context_type),
            ..Self::default()
        }
    }

    /// `context_type`, or the type implied by `target`.
    pub fn resolved_type(&self) -> Option<ContextType> {
        self.context_type
            .clone()
            .or_else(|| self.target.as_ref().map(ContextType::from))
    }

    /// Fill whichever of `target`/`context_type` is missing from the other.
    pub fn populate_defaults(&mut self) {
        if self.context_type.is_none() {
            self.context_type = self.target.as_ref().map(ContextType::from);
        }
        if self.target.is_none() {
            self.target = self.context_type.as_ref().map(Target::for_context_type);
        }
    }
}

/// Cluster endpoint shared by contexts and management-cluster servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterServer {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub endpoint: String,

    /// Path to the kubeconfig file.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,

    /// Kubeconfig context name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub context: String,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_management_cluster: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

/// Global (SaaS) endpoint shared by contexts and global servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalServer {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub endpoint: String,

    #[serde(skip_serializing_if = "GlobalServerAuth::is_empty")]
    pub auth: GlobalServerAuth,
}

/// Credentials obtained for a global endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalServerAuth {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub issuer: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_name: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,

    #[serde(rename = "IDToken", skip_serializing_if = "String::is_empty")]
    pub id_token: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub access_token: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,

    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub auth_type: String,
}

impl GlobalServerAuth {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolved_type_falls_back_to_target() {
        let ctx = Context {
            name: "c1".into(),
            target: Some(Target::MissionControl),
            ..Context::default()
        };
        assert_eq!(ctx.resolved_type(), Some(ContextType::MissionControl));
    }

    #[test]
    fn test_populate_defaults_both_directions() {
        let mut from_target = Context {
            name: "a".into(),
            target: Some(Target::Kubernetes),
            ..Context::default()
        };
        from_target.populate_defaults();
        assert_eq!(from_target.context_type, Some(ContextType::Kubernetes));

        let mut from_type = Context {
            name: "b".into(),
            context_type: Some(ContextType::Tanzu),
            ..Context::default()
        };
        from_type.populate_defaults();
        assert_eq!(from_type.target, Some(Target::Kubernetes));
    }

    #[test]
    fn test_minimal_yaml_omits_empty_fields() {
        let ctx = Context {
            name: "c1".into(),
            target: Some(Target::Kubernetes),
            cluster_opts: Some(ClusterServer {
                endpoint: "e1".into(),
                ..ClusterServer::default()
            }),
            ..Context::default()
        };
        let yaml = serde_yaml::to_string(&ctx).unwrap();
        assert_eq!(
            yaml,
            "name: c1\ntarget: kubernetes\nclusterOpts:\n  endpoint: e1\n"
        );
    }

    #[test]
    fn test_round_trip_with_metadata_and_auth() {
        let ctx = Context {
            name: "tmc".into(),
            target: Some(Target::MissionControl),
            context_type: Some(ContextType::MissionControl),
            global_opts: Some(GlobalServer {
                endpoint: "https://tmc.example".into(),
                auth: GlobalServerAuth {
                    issuer: "https://issuer".into(),
                    user_name: "me".into(),
                    permissions: vec!["read".into()],
                    id_token: "id".into(),
                    expiration: "2030-01-01T00:00:00Z".parse().ok(),
                    auth_type: "api-token".into(),
                    ..GlobalServerAuth::default()
                },
            }),
            additional_metadata: [("project".to_string(), json!("p1"))].into(),
            ..Context::default()
        };
        let yaml = serde_yaml::to_string(&ctx).unwrap();
        assert!(yaml.contains("IDToken: id"));
        assert!(yaml.contains("type: api-token"));
        let back: Context = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, ctx);
    }
}
