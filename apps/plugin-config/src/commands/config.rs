//! Whole-document commands: schema output and advisory validation.

use anyhow::Result;
use colored::Colorize;
use plugin_config::ConfigStore;

pub fn schema() -> Result<()> {
    println!("{}", plugin_config::schema_json_pretty()?);
    Ok(())
}

pub fn validate(store: &ConfigStore) -> Result<()> {
    let cfg = store.get_client_config()?;
    let warnings = plugin_config::validate(&cfg);

    if warnings.is_empty() {
        println!("{} Configuration is valid", "OK".green());
    } else {
        println!(
            "{} Configuration has {} warning(s):",
            "WARN".yellow(),
            warnings.len()
        );
        for w in &warnings {
            println!("  - {w}");
        }
    }
    println!("\nConfig files:");
    println!("  Main:     {}", store.paths().main.display());
    println!("  Next-gen: {}", store.paths().next_gen.display());
    println!("  Metadata: {}", store.paths().metadata.display());
    Ok(())
}
