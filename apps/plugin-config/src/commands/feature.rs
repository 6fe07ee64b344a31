//! Feature flag commands.

use anyhow::Result;
use clap::Subcommand;
use plugin_config::ConfigStore;

use super::context::report;

#[derive(Subcommand)]
pub enum FeatureCommands {
    /// Print whether a feature is enabled
    Get { plugin: String, key: String },

    /// Set a feature flag value
    Set {
        plugin: String,
        key: String,
        value: String,
    },

    /// Remove a feature flag
    Delete { plugin: String, key: String },
}

pub fn execute(store: &ConfigStore, cmd: FeatureCommands) -> Result<()> {
    match cmd {
        FeatureCommands::Get { plugin, key } => {
            println!("{}", store.is_feature_enabled(&plugin, &key)?);
            Ok(())
        }
        FeatureCommands::Set { plugin, key, value } => {
            let changed = store.set_feature(&plugin, &key, &value)?;
            report(changed, &format!("features.{plugin}.{key} = {value}"));
            Ok(())
        }
        FeatureCommands::Delete { plugin, key } => {
            store.delete_feature(&plugin, &key)?;
            eprintln!("Deleted features.{plugin}.{key}");
            Ok(())
        }
    }
}
