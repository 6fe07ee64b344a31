//! Contexts and current-context pointers.

use std::collections::{BTreeMap, HashSet};

use super::tree::ConfigTree;
use super::{ConfigStore, decode, decode_all, encode, force_find, force_find_in, require, set_scalar};
use crate::active_resource::{ActiveResource, ActiveResourceOptions};
use crate::bridge::{
    context_to_server, enforce_current_mutual_exclusion, has_server_counterpart,
    server_to_context,
};
use crate::error::{ConfigError, Result};
use crate::node::{self, Key, Node};
use crate::patch::{
    DISCOVERY_SOURCE, PatchStrategies, join_path, position_by_identity, remove_by_identity,
    upsert_by_identity,
};
use crate::types::{Context, ContextType, Server};

pub(super) const CONTEXTS: &str = "contexts";
pub(super) const SERVERS: &str = "servers";
pub(super) const CURRENT_CONTEXT: &str = "currentContext";
pub(super) const CURRENT_SERVER: &str = "current";
const ADDITIONAL_METADATA: &str = "additionalMetadata";
const DISCOVERY_SOURCES: &str = "discoverySources";
const NAME: &str = "name";

impl ConfigStore {
    /// The named context. Falls back to the context view of a same-named
    /// server when no context record exists.
    pub fn get_context(&self, name: &str) -> Result<Context> {
        require(name, "context", "name")?;
        lookup_context(&self.snapshot()?, name)?
            .ok_or_else(|| ConfigError::not_found("context", name))
    }

    pub fn context_exists(&self, name: &str) -> Result<bool> {
        Ok(lookup_context(&self.snapshot()?, name)?.is_some())
    }

    /// Stored contexts in document order, followed by contexts derived from
    /// servers that have no context record.
    pub fn get_all_contexts(&self) -> Result<Vec<Context>> {
        let tree = self.snapshot()?;
        let mut contexts: Vec<Context> = stored_contexts(&tree)?;
        let mut seen: HashSet<String> = contexts.iter().map(|c| c.name.clone()).collect();
        for server in stored_servers(&tree)? {
            if seen.insert(server.name.clone()) {
                tracing::warn!("context '{}' recovered from its server record", server.name);
                contexts.push(server_to_context(&server));
            }
        }
        Ok(contexts)
    }

    /// Insert or patch a context and its server counterpart; optionally make
    /// it current for its type.
    pub fn set_context(&self, context: &Context, set_current: bool) -> Result<bool> {
        require(&context.name, "context", "name")?;
        let mut context = context.clone();
        context.populate_defaults();

        self.update(&format!("context '{}'", context.name), |tree, strategies| {
            let mut changed = upsert_context(tree, &context, strategies)?;
            if has_server_counterpart(&context) {
                changed |= upsert_server(tree, &context_to_server(&context), strategies)?;
            }
            if set_current {
                changed |= mark_current(tree, &context_type_of(&context)?, &context.name)?;
            }
            Ok(changed)
        })
    }

    /// Remove a context, its server counterpart and any pointer to it.
    pub fn delete_context(&self, name: &str) -> Result<()> {
        require(name, "context", "name")?;
        self.delete("context", name, |tree| delete_principal(tree, name))
    }

    pub fn set_current_context(&self, name: &str) -> Result<bool> {
        require(name, "context", "name")?;
        self.update(&format!("current context '{name}'"), |tree, _| {
            let context =
                lookup_context(tree, name)?.ok_or_else(|| ConfigError::not_found("context", name))?;
            mark_current(tree, &context_type_of(&context)?, name)
        })
    }

    /// Current context of `context_type`. Without a `currentContext` entry, a
    /// legacy current server of a matching type is used.
    pub fn get_current_context(&self, context_type: &ContextType) -> Result<Context> {
        let tree = self.snapshot()?;
        let name = current_context_name(&tree, context_type)?.ok_or_else(|| {
            ConfigError::NoCurrent {
                what: format!("{context_type} context"),
            }
        })?;
        lookup_context(&tree, &name)?.ok_or_else(|| ConfigError::not_found("context", name))
    }

    /// Every current context, keyed by type. Dangling pointers are skipped.
    pub fn get_all_current_contexts(&self) -> Result<BTreeMap<ContextType, Context>> {
        let tree = self.snapshot()?;
        let mut current = BTreeMap::new();
        for (context_type, name) in current_entries(&tree) {
            match lookup_context(&tree, &name)? {
                Some(context) => {
                    current.insert(context_type, context);
                }
                None => tracing::warn!("current {context_type} context '{name}' does not exist"),
            }
        }
        Ok(current)
    }

    /// Names of all current contexts, in document order.
    pub fn get_all_active_context_names(&self) -> Result<Vec<String>> {
        Ok(current_entries(&self.snapshot()?)
            .into_iter()
            .map(|(_, name)| name)
            .collect())
    }

    /// Clear the current pointer of `context_type`, and the legacy current
    /// server if it named the same context.
    pub fn remove_current_context(&self, context_type: &ContextType) -> Result<bool> {
        self.update(&format!("current {context_type} context"), |tree, _| {
            let (Some(main), Some(next_gen)) = tree.roots_mut() else {
                return Ok(false);
            };
            let Some(current) = node::find_mut(next_gen, &[Key::mapping(CURRENT_CONTEXT)], false)
            else {
                return Ok(false);
            };
            let removed = remove_current_entries(current, |t| t == context_type);
            if removed.is_empty() {
                return Ok(false);
            }
            if context_type.is_server_representable() {
                clear_legacy_current(main, &removed);
            }
            Ok(true)
        })
    }

    /// Record the active project/space/cluster group of a tanzu context.
    ///
    /// The config is written and the lock released before the external sync
    /// runs; a sync failure leaves the config updated.
    pub fn set_active_resource(
        &self,
        name: &str,
        resource: &ActiveResource,
        options: ActiveResourceOptions,
    ) -> Result<bool> {
        require(name, "context", "name")?;
        resource.validate()?;

        let mut updated: Option<Context> = None;
        let changed = self.update(&format!("active resource of '{name}'"), |tree, _| {
            let contexts = tree
                .find_mut(&[Key::sequence(CONTEXTS)], false)
                .ok_or_else(|| ConfigError::not_found("context", name))?;
            let idx = position_by_identity(contexts, NAME, name)
                .ok_or_else(|| ConfigError::not_found("context", name))?;

            let mut context: Context = decode(&contexts.children[idx], "context")?;
            let context_type = context_type_of(&context)?;
            if context_type != ContextType::Tanzu {
                return Err(ConfigError::UnsupportedContextType {
                    name: name.to_string(),
                    expected: ContextType::Tanzu.to_string(),
                    actual: context_type.to_string(),
                });
            }

            resource.apply_to(&mut context.additional_metadata);
            let element = &mut contexts.children[idx];
            let changed = if context.additional_metadata.is_empty() {
                element.remove(ADDITIONAL_METADATA).is_some()
            } else {
                let metadata = encode(&context.additional_metadata, ADDITIONAL_METADATA)?;
                !element
                    .insert(ADDITIONAL_METADATA, metadata.clone())
                    .is_some_and(|old| old.same_content(&metadata))
            };
            updated = Some(context);
            Ok(changed)
        })?;

        if !options.skip_sync
            && let Some(context) = &updated
        {
            self.sync.sync(context, resource)?;
        }
        Ok(changed)
    }
}

/// Type of `context`, from `contextType` or `target`.
pub(super) fn context_type_of(context: &Context) -> Result<ContextType> {
    context.resolved_type().ok_or(ConfigError::Validation {
        entity: "context",
        field: "contextType",
    })
}

pub(super) fn stored_contexts(tree: &ConfigTree) -> Result<Vec<Context>> {
    let mut contexts: Vec<Context> = decode_all(tree.find(&[Key::sequence(CONTEXTS)]), "context")?;
    for context in &mut contexts {
        context.populate_defaults();
    }
    Ok(contexts)
}

pub(super) fn stored_servers(tree: &ConfigTree) -> Result<Vec<Server>> {
    decode_all(tree.find(&[Key::sequence(SERVERS)]), "server")
}

fn find_element<'a>(tree: &'a ConfigTree, seq: &str, name: &str) -> Option<&'a Node> {
    let seq = tree.find(&[Key::sequence(seq)])?;
    crate::patch::find_by_identity(seq, NAME, name)
}

/// Context record, or the context view of a same-named server.
pub(super) fn lookup_context(tree: &ConfigTree, name: &str) -> Result<Option<Context>> {
    if let Some(node) = find_element(tree, CONTEXTS, name) {
        let mut context: Context = decode(node, "context")?;
        context.populate_defaults();
        return Ok(Some(context));
    }
    match find_element(tree, SERVERS, name) {
        Some(node) => {
            let server: Server = decode(node, "server")?;
            tracing::warn!("context '{name}' recovered from its server record");
            Ok(Some(server_to_context(&server)))
        }
        None => Ok(None),
    }
}

/// Server record, or the server view of a server-representable context.
pub(super) fn lookup_server(tree: &ConfigTree, name: &str) -> Result<Option<Server>> {
    if let Some(node) = find_element(tree, SERVERS, name) {
        return decode(node, "server").map(Some);
    }
    match find_element(tree, CONTEXTS, name) {
        Some(node) => {
            let mut context: Context = decode(node, "context")?;
            context.populate_defaults();
            if !has_server_counterpart(&context) {
                return Ok(None);
            }
            tracing::warn!("server '{name}' recovered from its context record");
            Ok(Some(context_to_server(&context)))
        }
        None => Ok(None),
    }
}

pub(super) fn upsert_context(
    tree: &mut ConfigTree,
    context: &Context,
    strategies: &PatchStrategies,
) -> Result<bool> {
    upsert_named(tree, CONTEXTS, encode(context, "context")?, strategies)
}

pub(super) fn upsert_server(
    tree: &mut ConfigTree,
    server: &Server,
    strategies: &PatchStrategies,
) -> Result<bool> {
    upsert_named(tree, SERVERS, encode(server, "server")?, strategies)
}

/// Upsert a named element of `seq`. Its discovery sources are matched one by
/// one on the source name, so sources the update does not mention are kept.
fn upsert_named(
    tree: &mut ConfigTree,
    seq: &str,
    mut node: Node,
    strategies: &PatchStrategies,
) -> Result<bool> {
    let sources = node
        .remove(DISCOVERY_SOURCES)
        .filter(|s| s.is_sequence() && !s.children.is_empty());
    let elements = force_find(tree, &[Key::sequence(seq)])?;
    let mut changed = upsert_by_identity(elements, &node, NAME, strategies, seq)?;

    let Some(sources) = sources else {
        return Ok(changed);
    };
    let Some(idx) = node
        .get_str(NAME)
        .and_then(|name| position_by_identity(elements, NAME, name))
    else {
        return Ok(changed);
    };
    let existing = force_find_in(
        &mut elements.children[idx],
        &[Key::sequence(DISCOVERY_SOURCES)],
    )?;
    let prefix = join_path(seq, DISCOVERY_SOURCES);
    for source in &sources.children {
        changed |= DISCOVERY_SOURCE.upsert(existing, source, strategies, &prefix)?;
    }
    Ok(changed)
}

/// Make `name` the current context of `context_type`, evicting whatever may
/// not coexist with it. Server-representable types also move the legacy
/// current server pointer.
pub(super) fn mark_current(
    tree: &mut ConfigTree,
    context_type: &ContextType,
    name: &str,
) -> Result<bool> {
    let (Some(main), Some(next_gen)) = tree.roots_mut() else {
        return Err(ConfigError::NodeNotFound {
            path: CURRENT_CONTEXT.to_string(),
        });
    };
    let current = force_find_in(next_gen, &[Key::mapping(CURRENT_CONTEXT)])?;

    let key = context_type.as_str();
    let aliases: Vec<String> = current
        .keys()
        .filter(|k| *k != key && ContextType::from(*k) == *context_type)
        .map(str::to_string)
        .collect();
    let mut changed = false;
    for alias in &aliases {
        changed |= current.remove(alias).is_some();
    }
    changed |= set_scalar(current, key, name);

    let evicted = enforce_current_mutual_exclusion(current, main, context_type);
    changed |= !evicted.is_empty();
    if context_type.is_server_representable() {
        changed |= set_scalar(main, CURRENT_SERVER, name);
    }
    Ok(changed)
}

/// Remove entries whose type matches `pred`, returning the names removed.
fn remove_current_entries(current: &mut Node, pred: impl Fn(&ContextType) -> bool) -> Vec<String> {
    let keys: Vec<String> = current
        .keys()
        .filter(|k| pred(&ContextType::from(*k)))
        .map(str::to_string)
        .collect();
    keys.iter()
        .filter_map(|k| current.remove(k))
        .filter_map(|v| v.as_str().map(str::to_string))
        .filter(|n| !n.is_empty())
        .collect()
}

fn clear_legacy_current(main: &mut Node, names: &[String]) {
    let matches = main
        .get_str(CURRENT_SERVER)
        .is_some_and(|current| names.iter().any(|n| n == current));
    if matches {
        main.remove(CURRENT_SERVER);
    }
}

/// `(type, name)` for every non-empty `currentContext` entry.
pub(super) fn current_entries(tree: &ConfigTree) -> Vec<(ContextType, String)> {
    tree.find(&[Key::mapping(CURRENT_CONTEXT)])
        .map(|current| {
            current
                .pairs()
                .filter_map(|(k, v)| {
                    v.as_str()
                        .filter(|n| !n.is_empty())
                        .map(|n| (ContextType::from(k.value.as_str()), n.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn current_context_name(tree: &ConfigTree, context_type: &ContextType) -> Result<Option<String>> {
    if let Some((_, name)) = current_entries(tree)
        .into_iter()
        .find(|(t, _)| t == context_type)
    {
        return Ok(Some(name));
    }
    if !context_type.is_server_representable() {
        return Ok(None);
    }
    let Some(legacy) = tree
        .main_root()
        .and_then(|root| root.get_str(CURRENT_SERVER))
        .filter(|n| !n.is_empty())
    else {
        return Ok(None);
    };
    let matches = lookup_context(tree, legacy)?
        .and_then(|c| c.resolved_type())
        .is_some_and(|t| t == *context_type);
    Ok(matches.then(|| legacy.to_string()))
}

/// Remove the context and server named `name` and every pointer to it.
/// Returns whether a context or server record existed.
pub(super) fn delete_principal(tree: &mut ConfigTree, name: &str) -> Result<bool> {
    let mut found = false;
    if let Some(contexts) = tree.find_mut(&[Key::sequence(CONTEXTS)], false) {
        found |= remove_by_identity(contexts, NAME, name);
    }
    if let Some(servers) = tree.find_mut(&[Key::sequence(SERVERS)], false) {
        found |= remove_by_identity(servers, NAME, name);
    }
    if !found {
        return Ok(false);
    }

    let (Some(main), Some(next_gen)) = tree.roots_mut() else {
        return Ok(true);
    };
    if let Some(current) = node::find_mut(next_gen, &[Key::mapping(CURRENT_CONTEXT)], false) {
        let stale: Vec<String> = current
            .pairs()
            .filter(|(_, v)| v.as_str() == Some(name))
            .map(|(k, _)| k.value.clone())
            .collect();
        for key in &stale {
            current.remove(key);
        }
    }
    clear_legacy_current(main, &[name.to_string()]);
    Ok(true)
}
