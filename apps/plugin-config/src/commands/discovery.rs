//! Discovery source commands.

use anyhow::Result;
use clap::Subcommand;
use plugin_config::ConfigStore;

use super::print_yaml;

#[derive(Subcommand)]
pub enum DiscoveryCommands {
    /// List CLI-wide discovery sources
    List,

    /// Remove a discovery source by name
    Delete { name: String },
}

pub fn execute(store: &ConfigStore, cmd: DiscoveryCommands) -> Result<()> {
    match cmd {
        DiscoveryCommands::List => print_yaml(&store.get_cli_discovery_sources()?),
        DiscoveryCommands::Delete { name } => {
            store.delete_cli_discovery_source(&name)?;
            eprintln!("Deleted discovery source '{name}'");
            Ok(())
        }
    }
}
