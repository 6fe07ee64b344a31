//! Legacy servers, kept in step with their context counterparts.

use std::collections::HashSet;

use super::contexts::{
    CURRENT_CONTEXT, CURRENT_SERVER, context_type_of, delete_principal, lookup_server,
    mark_current, stored_contexts, stored_servers, upsert_context, upsert_server,
};
use super::{ConfigStore, require};
use crate::bridge::{context_to_server, has_server_counterpart, server_to_context};
use crate::error::{ConfigError, Result};
use crate::node::{self, Key};
use crate::types::{ContextType, Server};

impl ConfigStore {
    pub fn get_server(&self, name: &str) -> Result<Server> {
        require(name, "server", "name")?;
        lookup_server(&self.snapshot()?, name)?.ok_or_else(|| ConfigError::not_found("server", name))
    }

    pub fn server_exists(&self, name: &str) -> Result<bool> {
        Ok(lookup_server(&self.snapshot()?, name)?.is_some())
    }

    /// Stored servers, followed by servers derived from server-representable
    /// contexts that have no server record.
    pub fn get_all_servers(&self) -> Result<Vec<Server>> {
        let tree = self.snapshot()?;
        let mut servers = stored_servers(&tree)?;
        let mut seen: HashSet<String> = servers.iter().map(|s| s.name.clone()).collect();
        for context in stored_contexts(&tree)? {
            if has_server_counterpart(&context) && seen.insert(context.name.clone()) {
                tracing::warn!("server '{}' recovered from its context record", context.name);
                servers.push(context_to_server(&context));
            }
        }
        Ok(servers)
    }

    /// Insert or patch a server and its context counterpart; optionally make
    /// it the current server.
    pub fn set_server(&self, server: &Server, set_current: bool) -> Result<bool> {
        require(&server.name, "server", "name")?;
        let context = server_to_context(server);

        self.update(&format!("server '{}'", server.name), |tree, strategies| {
            let mut changed = upsert_server(tree, server, strategies)?;
            changed |= upsert_context(tree, &context, strategies)?;
            if set_current {
                changed |= mark_current(tree, &context_type_of(&context)?, &server.name)?;
            }
            Ok(changed)
        })
    }

    /// Remove a server, its context counterpart and any pointer to it.
    pub fn delete_server(&self, name: &str) -> Result<()> {
        require(name, "server", "name")?;
        self.delete("server", name, |tree| delete_principal(tree, name))
    }

    /// Point the legacy current server, and the current context of the
    /// server's type, at `name`.
    pub fn set_current_server(&self, name: &str) -> Result<bool> {
        require(name, "server", "name")?;
        self.update(&format!("current server '{name}'"), |tree, _| {
            let server =
                lookup_server(tree, name)?.ok_or_else(|| ConfigError::not_found("server", name))?;
            let context_type = context_type_of(&server_to_context(&server))?;
            mark_current(tree, &context_type, name)
        })
    }

    pub fn get_current_server(&self) -> Result<Server> {
        let tree = self.snapshot()?;
        let name = tree
            .main_root()
            .and_then(|root| root.get_str(CURRENT_SERVER))
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ConfigError::NoCurrent {
                what: "server".into(),
            })?;
        lookup_server(&tree, name)?.ok_or_else(|| ConfigError::not_found("server", name))
    }

    /// Clear the legacy current server and the server-representable current
    /// context entries that named it.
    pub fn remove_current_server(&self) -> Result<bool> {
        self.update("current server", |tree, _| {
            let (Some(main), Some(next_gen)) = tree.roots_mut() else {
                return Ok(false);
            };
            let Some(name) = main.remove(CURRENT_SERVER) else {
                return Ok(false);
            };
            let name = name.value;
            if let Some(current) = node::find_mut(next_gen, &[Key::mapping(CURRENT_CONTEXT)], false) {
                let stale: Vec<String> = current
                    .pairs()
                    .filter(|(k, v)| {
                        v.as_str() == Some(name.as_str())
                            && ContextType::from(k.value.as_str()).is_server_representable()
                    })
                    .map(|(k, _)| k.value.clone())
                    .collect();
                for key in &stale {
                    current.remove(key);
                }
            }
            Ok(true)
        })
    }
}
