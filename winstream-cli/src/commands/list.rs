//! List windows command

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use winstream_core::{config::ConfigFile, window, X11Query};

/// Arguments for the list command
#[derive(Args)]
pub struct ListArgs {
    /// X display to query (defaults to the config file, then ":99")
    #[arg(short, long)]
    display: Option<String>,

    /// Print the window list as JSON
    #[arg(long)]
    json: bool,

    /// Config file to load instead of the default
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// List visible windows on the display
pub async fn list(args: ListArgs) -> Result<()> {
    let file = match &args.config {
        Some(path) => ConfigFile::load_from(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => ConfigFile::load().context("Failed to load config file")?,
    };
    let display = args.display.unwrap_or(file.capture.display);
    let timeout = std::time::Duration::from_secs(file.capture.query_timeout_secs);

    let query = X11Query::new(display.as_str()).with_timeout(timeout);
    let windows = window::list_all(&query)
        .await
        .with_context(|| format!("Failed to list windows on display {}", display))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&windows)?);
        return Ok(());
    }

    println!("Winstream - Visible Windows on {}\n", display);

    if windows.is_empty() {
        println!("No windows found");
        return Ok(());
    }

    println!("{:<14} {}", "ID", "Name");
    println!("{}", "-".repeat(60));
    for w in &windows {
        println!("{:<14} {}", w.id, truncate(&w.name, 45));
    }

    println!("\nStream one with: winstream serve --window \"<name substring>\"");
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}
