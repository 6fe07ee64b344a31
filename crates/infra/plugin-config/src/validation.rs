//! Advisory validation for a client config.
//!
//! Validation is advisory: it reports inconsistencies a crash or a hand
//! edit may have left behind, but never blocks an operation.

use std::collections::HashSet;

use crate::bridge::has_server_counterpart;
use crate::types::ClientConfig;

/// An advisory warning about a configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryWarning {
    /// Machine-readable warning code.
    pub code: &'static str,

    /// Human-readable warning message.
    pub message: String,

    /// Dotted path to the problematic field.
    pub path: String,
}

impl std::fmt::Display for AdvisoryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.path, self.message)
    }
}

/// Validate a configuration and return advisory warnings.
pub fn validate(cfg: &ClientConfig) -> Vec<AdvisoryWarning> {
    let mut warnings = vec![];

    check_duplicates(
        cfg.contexts.iter().map(|c| c.name.as_str()),
        "contexts",
        "contexts.duplicate",
        &mut warnings,
    );
    check_duplicates(
        cfg.servers.iter().map(|s| s.name.as_str()),
        "servers",
        "servers.duplicate",
        &mut warnings,
    );
    check_duplicates(
        cfg.certs.iter().map(|c| c.host.as_str()),
        "certs",
        "certs.duplicate",
        &mut warnings,
    );
    if let Some(cli) = cfg.client_options.as_ref().and_then(|o| o.cli.as_ref()) {
        check_duplicates(
            cli.discovery_sources.iter().map(|s| s.name()),
            "clientOptions.cli.discoverySources",
            "discovery_sources.duplicate",
            &mut warnings,
        );
    }

    // Current pointers must name existing entities
    for (context_type, name) in &cfg.current_context {
        if !name.is_empty() && cfg.context(name).is_none() && cfg.server(name).is_none() {
            warnings.push(AdvisoryWarning {
                code: "current_context.missing",
                path: format!("currentContext.{context_type}"),
                message: format!("current {context_type} context '{name}' does not exist"),
            });
        }
    }
    if !cfg.current.is_empty() && cfg.server(&cfg.current).is_none() && cfg.context(&cfg.current).is_none() {
        warnings.push(AdvisoryWarning {
            code: "current.missing",
            path: "current".into(),
            message: format!("current server '{}' does not exist", cfg.current),
        });
    }

    // At most one non-privileged current context
    let exclusive: Vec<String> = cfg
        .current_context
        .iter()
        .filter(|(t, n)| !t.is_always_coexistent() && !n.is_empty())
        .map(|(t, _)| t.to_string())
        .collect();
    if exclusive.len() > 1 {
        warnings.push(AdvisoryWarning {
            code: "current_context.exclusive",
            path: "currentContext".into(),
            message: format!(
                "only one of these types may be current at a time: {}",
                exclusive.join(", ")
            ),
        });
    }

    // Server-representable contexts need a server record
    for context in &cfg.contexts {
        let mut context = context.clone();
        context.populate_defaults();
        if has_server_counterpart(&context) && cfg.server(&context.name).is_none() {
            warnings.push(AdvisoryWarning {
                code: "contexts.server_missing",
                path: format!("contexts.{}", context.name),
                message: format!("context '{}' has no matching server record", context.name),
            });
        }
    }

    warnings
}

fn check_duplicates<'a>(
    names: impl Iterator<Item = &'a str>,
    path: &str,
    code: &'static str,
    warnings: &mut Vec<AdvisoryWarning>,
) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for name in names {
        if !seen.insert(name) && reported.insert(name) {
            warnings.push(AdvisoryWarning {
                code,
                path: path.to_string(),
                message: format!("'{name}' appears more than once"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::context_to_server;
    use crate::types::{Context, ContextType};

    fn consistent() -> ClientConfig {
        let k8s = Context::new("k1", ContextType::Kubernetes);
        let tanzu = Context::new("t1", ContextType::Tanzu);
        ClientConfig {
            servers: vec![context_to_server(&k8s)],
            current: "k1".into(),
            contexts: vec![k8s, tanzu],
            current_context: [(ContextType::Kubernetes, "k1".to_string())].into(),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_consistent_config_has_no_warnings() {
        assert!(validate(&consistent()).is_empty());
        assert!(validate(&ClientConfig::default()).is_empty());
    }

    #[test]
    fn test_duplicate_names_reported_once() {
        let mut cfg = consistent();
        let dup = cfg.contexts[1].clone();
        cfg.contexts.push(dup.clone());
        cfg.contexts.push(dup);
        let warnings = validate(&cfg);
        assert_eq!(
            warnings.iter().filter(|w| w.code == "contexts.duplicate").count(),
            1
        );
    }

    #[test]
    fn test_dangling_and_exclusive_pointers() {
        let mut cfg = consistent();
        cfg.current_context
            .insert(ContextType::Tanzu, "gone".to_string());
        cfg.current = "nowhere".into();
        let codes: Vec<_> = validate(&cfg).into_iter().map(|w| w.code).collect();
        assert!(codes.contains(&"current_context.missing"));
        assert!(codes.contains(&"current.missing"));
        assert!(codes.contains(&"current_context.exclusive"));
    }

    #[test]
    fn test_privileged_type_may_coexist() {
        let mut cfg = consistent();
        let tmc = Context::new("m1", ContextType::MissionControl);
        cfg.servers.push(context_to_server(&tmc));
        cfg.contexts.push(tmc);
        cfg.current_context
            .insert(ContextType::MissionControl, "m1".to_string());
        assert!(validate(&cfg).is_empty());
    }

    #[test]
    fn test_context_without_server_record() {
        let mut cfg = consistent();
        cfg.servers.clear();
        cfg.current.clear();
        let warnings = validate(&cfg);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, "contexts.server_missing");
        assert_eq!(warnings[0].path, "contexts.k1");
    }
}
