//! Winstream CLI
//!
//! Stream one X11 window to web browsers as Motion-JPEG.
//!
//! # Usage
//!
//! ```bash
//! # List visible windows on the display
//! winstream list --display :99
//!
//! # Stream the first window whose title contains "Firefox"
//! winstream serve --window Firefox
//!
//! # Then open http://localhost:8181/ in a browser
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Winstream - stream an X11 window to the browser
#[derive(Parser)]
#[command(name = "winstream")]
#[command(version)]
#[command(about = "Stream a single X11 window to web browsers as MJPEG", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the viewer page and window stream
    Serve(commands::ServeArgs),

    /// List visible windows on the display
    #[command(alias = "ls")]
    List(commands::ListArgs),

    /// Manage the configuration file
    Config(commands::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("winstream={}", level).parse()?),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve(args) => commands::serve(args).await?,
        Commands::List(args) => commands::list(args).await?,
        Commands::Config(args) => commands::config(args).await?,
    }

    Ok(())
}
