//! Client options: feature flags, env vars, telemetry and CLI settings.

use std::collections::BTreeMap;

use super::tree::ConfigTree;
use super::{ConfigStore, decode, encode, force_find, require, set_scalar};
use crate::error::{ConfigError, Result};
use crate::node::{Key, Node};
use crate::patch::apply_patch;
use crate::types::{CliOptions, TelemetryOptions};

const CLIENT_OPTIONS: &str = "clientOptions";
const CLI: &str = "cli";
const FEATURES: &str = "features";
const ENV: &str = "env";
const TELEMETRY: &str = "telemetry";

fn cli_path() -> [Key; 2] {
    [Key::mapping(CLIENT_OPTIONS), Key::mapping(CLI)]
}

fn env_path() -> [Key; 2] {
    [Key::mapping(CLIENT_OPTIONS), Key::mapping(ENV)]
}

fn plugin_features_path(plugin: &str) -> [Key; 3] {
    [
        Key::mapping(CLIENT_OPTIONS),
        Key::mapping(FEATURES),
        Key::mapping(plugin),
    ]
}

fn telemetry_path() -> [Key; 3] {
    [
        Key::mapping(CLIENT_OPTIONS),
        Key::mapping(CLI),
        Key::mapping(TELEMETRY),
    ]
}

impl ConfigStore {
    /// Whether `clientOptions.features.<plugin>.<key>` is "true" (any case).
    pub fn is_feature_enabled(&self, plugin: &str, key: &str) -> Result<bool> {
        let tree = self.snapshot()?;
        Ok(tree
            .find(&plugin_features_path(plugin))
            .and_then(|flags| flags.get_str(key))
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true")))
    }

    pub fn set_feature(&self, plugin: &str, key: &str, value: &str) -> Result<bool> {
        require(plugin, "feature", "plugin")?;
        require(key, "feature", "key")?;
        self.update(&format!("feature {plugin}.{key}"), |tree, _| {
            Ok(set_scalar(
                force_find(tree, &plugin_features_path(plugin))?,
                key,
                value,
            ))
        })
    }

    pub fn delete_feature(&self, plugin: &str, key: &str) -> Result<()> {
        require(plugin, "feature", "plugin")?;
        require(key, "feature", "key")?;
        self.delete("feature", &format!("{plugin}.{key}"), |tree| {
            Ok(remove_key(tree, &plugin_features_path(plugin), key))
        })
    }

    pub fn get_env(&self, key: &str) -> Result<String> {
        require(key, "env", "key")?;
        self.snapshot()?
            .find(&env_path())
            .and_then(|env| env.get_str(key))
            .map(str::to_string)
            .ok_or_else(|| ConfigError::not_found("env", key))
    }

    pub fn get_all_env_vars(&self) -> Result<BTreeMap<String, String>> {
        let tree = self.snapshot()?;
        Ok(tree
            .find(&env_path())
            .map(|env| {
                env.pairs()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.value.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default())
    }

    pub fn set_env(&self, key: &str, value: &str) -> Result<bool> {
        require(key, "env", "key")?;
        self.update(&format!("env {key}"), |tree, _| {
            Ok(set_scalar(force_find(tree, &env_path())?, key, value))
        })
    }

    pub fn delete_env(&self, key: &str) -> Result<()> {
        require(key, "env", "key")?;
        self.delete("env", key, |tree| Ok(remove_key(tree, &env_path(), key)))
    }

    pub fn get_cli_telemetry_options(&self) -> Result<TelemetryOptions> {
        let tree = self.snapshot()?;
        tree.find(&telemetry_path())
            .map(|node| decode(node, "telemetry options"))
            .transpose()?
            .ok_or_else(|| ConfigError::not_found("telemetry options", TELEMETRY))
    }

    /// Merge `options` into the stored telemetry options.
    pub fn set_cli_telemetry_options(&self, options: &TelemetryOptions) -> Result<bool> {
        self.update("telemetry options", |tree, strategies| {
            let node = encode(options, "telemetry options")?;
            let existing = force_find(tree, &telemetry_path())?;
            Ok(apply_patch(
                &node,
                existing,
                strategies,
                "clientOptions.cli.telemetry",
            )?)
        })
    }

    pub fn delete_cli_telemetry_options(&self) -> Result<()> {
        self.delete("telemetry options", TELEMETRY, |tree| {
            Ok(remove_key(tree, &cli_path(), TELEMETRY))
        })
    }

    /// CLI options, or the defaults when none are stored.
    pub fn get_cli_options(&self) -> Result<CliOptions> {
        let tree = self.snapshot()?;
        tree.find(&cli_path())
            .map_or_else(|| Ok(CliOptions::default()), |node| decode(node, "cli options"))
    }

    pub fn set_edition(&self, edition: &str) -> Result<bool> {
        self.set_cli_option("edition", edition)
    }

    pub fn set_bom_repo(&self, repo: &str) -> Result<bool> {
        self.set_cli_option("bomRepo", repo)
    }

    pub fn set_compatibility_file_path(&self, path: &str) -> Result<bool> {
        self.set_cli_option("compatibilityFilePath", path)
    }

    pub fn set_unstable_version_selector(&self, selector: &str) -> Result<bool> {
        self.set_cli_option("unstableVersionSelector", selector)
    }

    fn set_cli_option(&self, key: &'static str, value: &str) -> Result<bool> {
        require(value, "cli option", key)?;
        self.update(&format!("cli option {key}"), |tree, _| {
            Ok(set_scalar(force_find(tree, &cli_path())?, key, value))
        })
    }
}

fn remove_key(tree: &mut ConfigTree, parent: &[Key], key: &str) -> bool {
    tree.find_mut(parent, false)
        .and_then(|node: &mut Node| node.remove(key))
        .is_some()
}
