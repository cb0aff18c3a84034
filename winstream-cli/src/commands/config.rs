//! Config command - manage the configuration file

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use winstream_core::config::{sample_config, ConfigFile};

/// Arguments for the config command
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the path to the config file
    Path,

    /// Show the effective configuration
    Show,

    /// Write a sample config file to the default path
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print a sample configuration to stdout
    Sample,
}

/// Run config subcommand
pub async fn config(args: ConfigArgs) -> Result<()> {
    let path = ConfigFile::default_path();

    match args.command {
        ConfigCommand::Path => {
            let state = if path.exists() { "exists" } else { "does not exist" };
            println!("{} ({})", path.display(), state);
        }
        ConfigCommand::Show => {
            let file = ConfigFile::load_from(&path).context("Failed to load config file")?;
            if path.exists() {
                println!("# {}\n", path.display());
            } else {
                println!("# No file at {}; showing defaults\n", path.display());
            }
            print!("{}", toml::to_string_pretty(&file).context("Failed to render config")?);
        }
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                println!("Configuration file already exists: {}", path.display());
                println!("Use --force to overwrite, or edit the existing file.");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
            std::fs::write(&path, sample_config()).context("Failed to write config file")?;

            println!("Created configuration file: {}", path.display());
        }
        ConfigCommand::Sample => {
            print!("{}", sample_config());
        }
    }

    Ok(())
}
