//! Plugin environment variable commands.

use anyhow::Result;
use clap::Subcommand;
use plugin_config::ConfigStore;

use super::context::report;
use super::print_yaml;

#[derive(Subcommand)]
pub enum EnvCommands {
    /// List all variables
    List,

    /// Print one variable
    Get { key: String },

    /// Set a variable
    Set { key: String, value: String },

    /// Remove a variable
    Unset { key: String },
}

pub fn execute(store: &ConfigStore, cmd: EnvCommands) -> Result<()> {
    match cmd {
        EnvCommands::List => print_yaml(&store.get_all_env_vars()?),
        EnvCommands::Get { key } => {
            println!("{}", store.get_env(&key)?);
            Ok(())
        }
        EnvCommands::Set { key, value } => {
            let changed = store.set_env(&key, &value)?;
            report(changed, &format!("{key}={value}"));
            Ok(())
        }
        EnvCommands::Unset { key } => {
            store.delete_env(&key)?;
            eprintln!("Unset {key}");
            Ok(())
        }
    }
}
