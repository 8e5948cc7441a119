//! Configuration view and validation commands (`mintdesk config`).

use anyhow::Result;
use mintdesk::config::{MintdeskConfig, MintdeskToml};

use super::super::ConfigCommands;

fn print_toml(toml: &MintdeskToml) {
    println!("[server]");
    println!("  host = \"{}\"", toml.server.host);
    println!("  port = {}", toml.server.port);
    println!("  dev_mode = {}", toml.server.dev_mode);
    println!();
    println!("[database]");
    println!("  path = \"{}\"", toml.database.path.display());
    println!();
    println!("[minting]");
    println!("  batch_mode = \"{}\"", toml.minting.batch_mode);
    println!("  tx_ref_prefix = \"{}\"", toml.minting.tx_ref_prefix);
    println!();
    println!("[logging]");
    println!("  level = \"{}\"", toml.logging.level);
    println!("  json = {}", toml.logging.json);
    if let Some(dir) = &toml.logging.directory {
        println!("  directory = \"{}\"", dir.display());
    }
    println!();
}

pub fn cmd_config(config: &MintdeskConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = config.config_path();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("{}", console::style("mintdesk configuration").bold().cyan());
            println!();
            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No mintdesk.toml found at {}; using defaults.", config_path.display());
            }
            println!();
            println!("Effective values (with env overrides):");
            println!();
            print_toml(&config.toml);
            println!("Database: {}", config.db_path().display());
            println!();
        }
        Some(ConfigCommands::Validate) => {
            let problems = config.validate();
            if problems.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration problems:");
                for problem in &problems {
                    println!("  - {}", problem);
                }
                anyhow::bail!("{} configuration problem(s) found", problems.len());
            }
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("mintdesk.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }
            std::fs::create_dir_all(&config.mintdesk_dir)?;
            MintdeskToml::default().save(&config_path)?;
            println!("Created mintdesk.toml at {}", config_path.display());
        }
    }

    Ok(())
}
