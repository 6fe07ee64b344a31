//! Server commands.

use anyhow::Result;
use clap::Subcommand;
use plugin_config::ConfigStore;

use super::print_yaml;

#[derive(Subcommand)]
pub enum ServerCommands {
    /// List servers, including those derived from contexts
    List {
        /// Only show the current server
        #[arg(long)]
        current: bool,
    },
}

pub fn execute(store: &ConfigStore, cmd: ServerCommands) -> Result<()> {
    match cmd {
        ServerCommands::List { current: false } => print_yaml(&store.get_all_servers()?),
        ServerCommands::List { current: true } => print_yaml(&store.get_current_server()?),
    }
}
