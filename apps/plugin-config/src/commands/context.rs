//! Context commands.

use anyhow::{Context as _, Result};
use clap::Subcommand;
use plugin_config::{ConfigStore, ContextType};

use super::print_yaml;

#[derive(Subcommand)]
pub enum ContextCommands {
    /// List contexts
    List {
        /// Only show the current context of each type
        #[arg(long)]
        current: bool,
    },

    /// Show one context, or the current context of a type
    Get {
        /// Context name
        name: Option<String>,

        /// Show the current context of this type instead
        #[arg(long = "type", value_name = "TYPE", conflicts_with = "name")]
        context_type: Option<String>,
    },

    /// Make a context current for its type
    Use {
        /// Context name
        name: String,
    },

    /// Delete a context and its server counterpart
    Delete {
        /// Context name
        name: String,
    },

    /// Clear the current context of a type
    Unset {
        /// Context type (kubernetes, mission-control, tanzu)
        #[arg(long = "type", value_name = "TYPE")]
        context_type: String,
    },
}

pub fn execute(store: &ConfigStore, cmd: ContextCommands) -> Result<()> {
    match cmd {
        ContextCommands::List { current: false } => print_yaml(&store.get_all_contexts()?),
        ContextCommands::List { current: true } => print_yaml(&store.get_all_current_contexts()?),
        ContextCommands::Get {
            context_type: Some(t),
            ..
        } => print_yaml(&store.get_current_context(&ContextType::from(t.as_str()))?),
        ContextCommands::Get {
            name: Some(name), ..
        } => print_yaml(&store.get_context(&name)?),
        ContextCommands::Get { .. } => anyhow::bail!("Provide a context name or --type"),
        ContextCommands::Use { name } => {
            let changed = store
                .set_current_context(&name)
                .with_context(|| format!("Failed to use context '{name}'"))?;
            report(changed, &format!("Context '{name}' is current"));
            Ok(())
        }
        ContextCommands::Delete { name } => {
            store
                .delete_context(&name)
                .with_context(|| format!("Failed to delete context '{name}'"))?;
            eprintln!("Deleted context '{name}'");
            Ok(())
        }
        ContextCommands::Unset { context_type } => {
            let context_type = ContextType::from(context_type.as_str());
            let changed = store.remove_current_context(&context_type)?;
            report(changed, &format!("No current {context_type} context"));
            Ok(())
        }
    }
}

pub(super) fn report(changed: bool, message: &str) {
    if changed {
        eprintln!("{message}");
    } else {
        eprintln!("{message} (unchanged)");
    }
}
