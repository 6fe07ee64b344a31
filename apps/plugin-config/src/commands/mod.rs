pub mod config;
pub mod context;
pub mod discovery;
pub mod env;
pub mod feature;
pub mod server;

use anyhow::{Context, Result};
use serde::Serialize;

/// Write `value` to stdout as YAML.
pub fn print_yaml<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(value).context("Failed to render YAML output")?;
    print!("{yaml}");
    Ok(())
}
