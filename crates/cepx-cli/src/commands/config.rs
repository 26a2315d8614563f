//! Config command - show and edit the JSON configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use cepx_core::models::config::CepxConfig;

use super::load_config_or_default;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the configuration in effect
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print one value (e.g., "export.final_sheet")
    Get { key: String },

    /// Change one value
    Set {
        key: String,
        /// New value (JSON, or a bare string)
        value: String,
    },

    /// Show where the configuration file lives
    Path,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(super::default_config_path);

    match args.command {
        ConfigCommand::Show => {
            let config = load_config_or_default(&path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            save(&CepxConfig::default(), &path)?;
            println!(
                "{} Created configuration file at {}",
                style("✓").green(),
                path.display()
            );
        }
        ConfigCommand::Get { key } => {
            let json = serde_json::to_value(load_config_or_default(&path)?)?;
            println!("{}", serde_json::to_string_pretty(lookup(&json, &key)?)?);
        }
        ConfigCommand::Set { key, value } => {
            let value = parse_value(&value);
            let shown = serde_json::to_string(&value)?;
            let config = set_value(load_config_or_default(&path)?, &key, value)?;
            save(&config, &path)?;
            println!("{} Set {} = {}", style("✓").green(), key, shown);
        }
        ConfigCommand::Path => {
            println!("Configuration file: {}", path.display());
            if path.exists() {
                println!("Status: {}", style("exists").green());
            } else {
                println!("Status: {}", style("not created").yellow());
                println!("\nRun 'cepx config init' to create a configuration file.");
            }
        }
    }

    Ok(())
}

/// Dotted key as a JSON pointer: `table.sheet` is `/table/sheet`.
fn key_pointer(key: &str) -> String {
    format!("/{}", key.replace('.', "/"))
}

fn lookup<'a>(json: &'a Value, key: &str) -> anyhow::Result<&'a Value> {
    json.pointer(&key_pointer(key))
        .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))
}

/// Replace the value at an existing key; the result must still be a valid configuration.
fn set_value(config: CepxConfig, key: &str, value: Value) -> anyhow::Result<CepxConfig> {
    let mut json = serde_json::to_value(config)?;
    let slot = json
        .pointer_mut(&key_pointer(key))
        .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
    *slot = value;

    serde_json::from_value(json).with_context(|| format!("Invalid value for {key}"))
}

fn parse_value(value: &str) -> Value {
    serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

fn save(config: &CepxConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(config.save(path)?)
}
