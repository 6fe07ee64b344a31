//! Plugin config CLI.
//!
//! The `plugin-config` command reads and edits the config files shared by
//! CLI plugins. Data goes to stdout as YAML; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use plugin_config::{ConfigError, ConfigStore};

mod commands;

#[derive(Parser)]
#[command(name = "plugin-config")]
#[command(about = "Inspect and edit the shared plugin configuration")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding all config files (overrides PLUGIN_CONFIG*)
    #[arg(long, global = true, env = "PLUGIN_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Contexts and current-context pointers
    Context {
        #[command(subcommand)]
        command: commands::context::ContextCommands,
    },

    /// Legacy server records
    Server {
        #[command(subcommand)]
        command: commands::server::ServerCommands,
    },

    /// Plugin feature flags
    Feature {
        #[command(subcommand)]
        command: commands::feature::FeatureCommands,
    },

    /// Environment variables passed to plugins
    Env {
        #[command(subcommand)]
        command: commands::env::EnvCommands,
    },

    /// CLI-wide plugin discovery sources
    Discovery {
        #[command(subcommand)]
        command: commands::discovery::DiscoveryCommands,
    },

    /// Output the JSON Schema of the client config document
    Schema,

    /// Validate the stored configuration and show warnings
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!("plugin_config={level}"))
            }),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let fatal = e
                .downcast_ref::<ConfigError>()
                .is_some_and(ConfigError::is_fatal);
            if fatal {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn open_store(config_dir: Option<PathBuf>) -> Result<ConfigStore> {
    let builder = ConfigStore::builder();
    let builder = match config_dir {
        Some(dir) => builder.config_dir(dir),
        None => builder,
    };
    Ok(builder.build()?)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Schema => commands::config::schema(),
        Commands::Context { command } => {
            commands::context::execute(&open_store(cli.config_dir)?, command)
        }
        Commands::Server { command } => {
            commands::server::execute(&open_store(cli.config_dir)?, command)
        }
        Commands::Feature { command } => {
            commands::feature::execute(&open_store(cli.config_dir)?, command)
        }
        Commands::Env { command } => commands::env::execute(&open_store(cli.config_dir)?, command),
        Commands::Discovery { command } => {
            commands::discovery::execute(&open_store(cli.config_dir)?, command)
        }
        Commands::Validate => commands::config::validate(&open_store(cli.config_dir)?),
    }
}
