//! CLI-wide plugin discovery sources (`clientOptions.cli.discoverySources`).

use super::tree::ConfigTree;
use super::{ConfigStore, decode, decode_all, encode, force_find, require};
use crate::error::{ConfigError, Result};
use crate::node::Key;
use crate::patch::{DISCOVERY_SOURCE, PatchStrategies};
use crate::types::PluginDiscovery;

const STRATEGY_PREFIX: &str = "clientOptions.cli.discoverySources";

fn sources_path() -> [Key; 3] {
    [
        Key::mapping("clientOptions"),
        Key::mapping("cli"),
        Key::sequence("discoverySources"),
    ]
}

impl ConfigStore {
    pub fn get_cli_discovery_sources(&self) -> Result<Vec<PluginDiscovery>> {
        decode_all(self.snapshot()?.find(&sources_path()), "discovery source")
    }

    pub fn get_cli_discovery_source(&self, name: &str) -> Result<PluginDiscovery> {
        require(name, "discovery source", "name")?;
        let tree = self.snapshot()?;
        tree.find(&sources_path())
            .and_then(|seq| DISCOVERY_SOURCE.find(seq, name))
            .map(|node| decode(node, "discovery source"))
            .transpose()?
            .ok_or_else(|| ConfigError::not_found("discovery source", name))
    }

    /// Insert or update one source, matched by name whatever its variant.
    pub fn set_cli_discovery_source(&self, source: &PluginDiscovery) -> Result<bool> {
        require(source.name(), "discovery source", "name")?;
        self.update(
            &format!("discovery source '{}'", source.name()),
            |tree, strategies| upsert_source(tree, source, strategies),
        )
    }

    /// Upsert several sources in one locked cycle. Sources not listed are kept.
    pub fn set_cli_discovery_sources(&self, sources: &[PluginDiscovery]) -> Result<bool> {
        for source in sources {
            require(source.name(), "discovery source", "name")?;
        }
        self.update("discovery sources", |tree, strategies| {
            let mut changed = false;
            for source in sources {
                changed |= upsert_source(tree, source, strategies)?;
            }
            Ok(changed)
        })
    }

    pub fn delete_cli_discovery_source(&self, name: &str) -> Result<()> {
        require(name, "discovery source", "name")?;
        self.delete("discovery source", name, |tree| {
            Ok(tree
                .find_mut(&sources_path(), false)
                .is_some_and(|seq| DISCOVERY_SOURCE.remove(seq, name)))
        })
    }
}

fn upsert_source(
    tree: &mut ConfigTree,
    source: &PluginDiscovery,
    strategies: &PatchStrategies,
) -> Result<bool> {
    let node = encode(source, "discovery source")?;
    let seq = force_find(tree, &sources_path())?;
    Ok(DISCOVERY_SOURCE.upsert(seq, &node, strategies, STRATEGY_PREFIX)?)
}
