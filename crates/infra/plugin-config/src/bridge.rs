//! Conversion between legacy servers and contexts, and the exclusivity rule
//! for current-context pointers.
//!
//! Conversions never fail: a type with no counterpart is carried through as
//! the `Other` tag of the target enum, so newer documents degrade instead of
//! erroring.

use crate::node::Node;
use crate::types::{
    ClusterServer, Context, ContextType, ManagementClusterServer, Server, ServerType, Target,
};

/// Context view of a legacy server.
pub fn server_to_context(server: &Server) -> Context {
    let context_type = match &server.server_type {
        Some(ServerType::ManagementCluster) => ContextType::Kubernetes,
        Some(ServerType::Global) => ContextType::MissionControl,
        Some(ServerType::Other(tag)) => ContextType::from(tag.as_str()),
        None if server.global_opts.is_some() => ContextType::MissionControl,
        None => ContextType::Kubernetes,
    };

    let cluster_opts = server
        .management_cluster_opts
        .as_ref()
        .map(|mc| ClusterServer {
            endpoint: mc.endpoint.clone(),
            path: mc.path.clone(),
            context: mc.context.clone(),
            is_management_cluster: server.is_management_cluster(),
            annotation: mc.annotation.clone(),
        });

    Context {
        name: server.name.clone(),
        target: Some(Target::for_context_type(&context_type)),
        context_type: Some(context_type),
        cluster_opts,
        global_opts: server.global_opts.clone(),
        discovery_sources: server.discovery_sources.clone(),
        ..Context::default()
    }
}

/// Legacy server view of a context. `additionalMetadata` has no legacy field
/// and is dropped.
pub fn context_to_server(context: &Context) -> Server {
    let server_type = match context.resolved_type() {
        Some(ContextType::Kubernetes) | None => ServerType::ManagementCluster,
        Some(ContextType::MissionControl) => ServerType::Global,
        Some(other) => ServerType::Other(other.as_str().to_string()),
    };

    let management_cluster_opts =
        context
            .cluster_opts
            .as_ref()
            .map(|opts| ManagementClusterServer {
                endpoint: opts.endpoint.clone(),
                path: opts.path.clone(),
                context: opts.context.clone(),
                annotation: opts.annotation.clone(),
            });

    Server {
        name: context.name.clone(),
        server_type: Some(server_type),
        management_cluster_opts,
        global_opts: context.global_opts.clone(),
        discovery_sources: context.discovery_sources.clone(),
    }
}

/// Whether `context` has a legacy server counterpart that must be kept in sync.
pub fn has_server_counterpart(context: &Context) -> bool {
    context
        .resolved_type()
        .is_none_or(|t| t.is_server_representable())
}

/// Evict every current pointer that may not coexist with `just_set`.
///
/// `current_context` is the `currentContext` mapping and `legacy_root` the
/// root mapping holding the legacy `current` server pointer. Entries of the
/// always-coexistent type are never evicted, and setting that type evicts
/// nothing. Returns the evicted context names.
pub fn enforce_current_mutual_exclusion(
    current_context: &mut Node,
    legacy_root: &mut Node,
    just_set: &ContextType,
) -> Vec<String> {
    if just_set.is_always_coexistent() || !current_context.is_mapping() {
        return Vec::new();
    }

    let evict: Vec<String> = current_context
        .keys()
        .filter(|k| {
            let t = ContextType::from(*k);
            t != *just_set && !t.is_always_coexistent()
        })
        .map(str::to_string)
        .collect();

    let mut evicted = Vec::with_capacity(evict.len());
    for key in &evict {
        if let Some(name) = current_context.remove(key)
            && let Some(name) = name.as_str().filter(|n| !n.is_empty())
        {
            tracing::debug!("evicting current {key} context '{name}'");
            evicted.push(name.to_string());
        }
    }

    let clear_legacy = legacy_root
        .get_str("current")
        .is_some_and(|current| evicted.iter().any(|n| n == current));
    if clear_legacy {
        legacy_root.remove("current");
    }
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::yaml::{emit_document, parse_document};
    use crate::types::{GlobalServer, OciDiscovery, PluginDiscovery};
    use pretty_assertions::assert_eq;

    fn mapping(text: &str) -> Node {
        parse_document(text).unwrap().content().unwrap().clone()
    }

    #[test]
    fn test_management_cluster_server_to_context() {
        let server = Server {
            name: "mc".into(),
            server_type: Some(ServerType::ManagementCluster),
            management_cluster_opts: Some(ManagementClusterServer {
                endpoint: "https://mc".into(),
                path: "/kube".into(),
                context: "admin@mc".into(),
                annotation: None,
            }),
            ..Server::default()
        };
        let ctx = server_to_context(&server);
        assert_eq!(ctx.context_type, Some(ContextType::Kubernetes));
        assert_eq!(ctx.target, Some(Target::Kubernetes));
        let opts = ctx.cluster_opts.as_ref().unwrap();
        assert!(opts.is_management_cluster);
        assert_eq!(opts.context, "admin@mc");
        assert_eq!(context_to_server(&ctx), server);
    }

    #[test]
    fn test_global_round_trip() {
        let ctx = Context {
            global_opts: Some(GlobalServer {
                endpoint: "https://tmc".into(),
                ..GlobalServer::default()
            }),
            discovery_sources: vec![PluginDiscovery::from(crate::types::DiscoverySource::Oci(
                OciDiscovery {
                    name: "default".into(),
                    image: "img".into(),
                },
            ))],
            ..Context::new("tmc", ContextType::MissionControl)
        };
        let server = context_to_server(&ctx);
        assert_eq!(server.server_type, Some(ServerType::Global));
        assert_eq!(server_to_context(&server), ctx);
    }

    #[test]
    fn test_unmappable_type_is_carried_verbatim() {
        let ctx = Context::new("t", ContextType::Tanzu);
        let server = context_to_server(&ctx);
        assert_eq!(server.server_type, Some(ServerType::Other("tanzu".into())));
        assert!(!has_server_counterpart(&ctx));

        let back = server_to_context(&server);
        assert_eq!(back.context_type, Some(ContextType::Tanzu));
    }

    #[test]
    fn test_server_type_tags_resolve_to_known_context_types() {
        let tanzu = Server {
            name: "t".into(),
            server_type: Some(ServerType::Other("Tanzu".into())),
            ..Server::default()
        };
        assert_eq!(
            server_to_context(&tanzu).resolved_type(),
            Some(ContextType::Tanzu)
        );

        let edge = Server {
            name: "e".into(),
            server_type: Some(ServerType::Other("edge".into())),
            ..Server::default()
        };
        assert_eq!(
            server_to_context(&edge).context_type,
            Some(ContextType::Other("edge".into()))
        );
    }

    #[test]
    fn test_exclusion_evicts_other_non_privileged_types() {
        let mut cc = mapping("kubernetes: k1\nmission-control: m1\ntanzu: t1\n");
        let mut root = mapping("current: k1\nservers: []\n");
        let evicted =
            enforce_current_mutual_exclusion(&mut cc, &mut root, &ContextType::Tanzu);
        assert_eq!(evicted, vec!["k1".to_string()]);
        assert_eq!(
            emit_document(&cc).unwrap(),
            "mission-control: m1\ntanzu: t1\n"
        );
        assert!(!root.contains_key("current"));
    }

    #[test]
    fn test_exclusion_keeps_unrelated_legacy_current() {
        let mut cc = mapping("tanzu: t1\n");
        let mut root = mapping("current: m1\n");
        enforce_current_mutual_exclusion(&mut cc, &mut root, &ContextType::Kubernetes);
        assert_eq!(root.get_str("current"), Some("m1"));
        assert_eq!(cc.keys().count(), 0);
    }

    #[test]
    fn test_privileged_type_evicts_nothing() {
        let mut cc = mapping("kubernetes: k1\nmission-control: m1\n");
        let before = cc.clone();
        let mut root = mapping("current: k1\n");
        let evicted =
            enforce_current_mutual_exclusion(&mut cc, &mut root, &ContextType::MissionControl);
        assert!(evicted.is_empty());
        assert_eq!(cc, before);
        assert_eq!(root.get_str("current"), Some("k1"));
    }

    #[test]
    fn test_alias_keys_are_recognised() {
        let mut cc = mapping("k8s: k1\ntmc: m1\n");
        let mut root = Node::mapping();
        enforce_current_mutual_exclusion(&mut cc, &mut root, &ContextType::Tanzu);
        assert_eq!(cc.keys().collect::<Vec<_>>(), vec!["tmc"]);
    }
}
