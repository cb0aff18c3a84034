//! Serve command - stream a window over HTTP

use anyhow::{Context, Result};
use clap::Args;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use winstream_core::{
    config::ConfigFile, shutdown::wait_for_signal, window, FfmpegLauncher, Shutdown, StreamConfig,
    StreamServer, WinstreamError, X11Query,
};

/// Arguments for the serve command
#[derive(Args)]
pub struct ServeArgs {
    /// Window title substring to stream (empty matches any visible window)
    #[arg(short, long)]
    window: Option<String>,

    /// X display the window lives on
    #[arg(short, long)]
    display: Option<String>,

    /// HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Capture framerate
    #[arg(long)]
    framerate: Option<u32>,

    /// MJPEG quantizer, 1 (best) to 31
    #[arg(short, long)]
    quality: Option<u8>,

    /// Maximum simultaneous streams
    #[arg(long)]
    max_sessions: Option<u32>,

    /// Viewer page template (must contain {{stream_path}})
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Path to the ffmpeg binary
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Config file to load instead of the default
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ServeArgs {
    /// Command-line flags override the config file
    fn apply(self, mut config: StreamConfig) -> StreamConfig {
        if let Some(window) = self.window {
            config.window_name = window;
        }
        if let Some(display) = self.display {
            config.display = display;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(framerate) = self.framerate {
            config.framerate = framerate;
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(max) = self.max_sessions {
            config.max_sessions = max;
        }
        if let Some(template) = self.template {
            config.template_path = Some(template);
        }
        if let Some(ffmpeg) = self.ffmpeg {
            config.ffmpeg_path = ffmpeg;
        }
        config
    }
}

/// Start the stream server and run until SIGINT/SIGTERM
pub async fn serve(args: ServeArgs) -> Result<()> {
    let path = args.config.clone().unwrap_or_else(ConfigFile::default_path);
    let file = ConfigFile::load_from(&path)
        .with_context(|| format!("Failed to load config file {}", path.display()))?;
    let config = args.apply(file.to_stream_config()?);

    let query = Arc::new(X11Query::new(config.display.as_str()).with_timeout(config.query_timeout));
    let launcher = Arc::new(FfmpegLauncher::from_config(&config));
    let shutdown = Shutdown::new();

    let server = match StreamServer::new(config, query.clone(), launcher, shutdown.listener()) {
        Ok(server) => server,
        Err(e) => return Err(startup_error(e)),
    };
    let config = server.config();

    print_windows(query.as_ref(), config).await;

    let listener = TcpListener::bind(config.socket_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.socket_addr()))?;
    let addr = listener.local_addr().context("Failed to read listener address")?;

    println!("Winstream - Streaming window: {}", display_name(&config.window_name));
    println!("  Display:  {}", config.display);
    println!("  Viewer:   http://{}/", addr);
    println!("  Stream:   http://{}/stream", addr);
    println!("  Sessions: up to {}", config.max_sessions);
    println!();
    println!("Press Ctrl+C to stop...");

    tokio::select! {
        result = server.serve(listener) => {
            result.context("Server stopped unexpectedly")?;
        }
        signal = wait_for_signal() => {
            match signal {
                Ok(name) => info!("Received {}, shutting down", name),
                Err(e) => error!("Failed to listen for signals: {}", e),
            }
        }
    }

    println!("\nStopping streams...");
    shutdown.trigger();
    if !server.drain(config.shutdown_grace).await {
        warn!("Exiting with streams still running");
    }

    println!("Stopped.");
    Ok(())
}

/// Startup diagnostics: the windows visible on the display
async fn print_windows(query: &X11Query, config: &StreamConfig) {
    match window::list_all(query).await {
        Ok(windows) if windows.is_empty() => println!("No windows found on {}\n", config.display),
        Ok(windows) => {
            println!("Visible windows on {}:", config.display);
            for w in windows {
                println!("   - {}", w);
            }
            println!();
        }
        Err(e) => warn!("Could not list windows on {}: {}", config.display, e),
    }
}

fn display_name(filter: &str) -> &str {
    if filter.is_empty() {
        "(any visible window)"
    } else {
        filter
    }
}

fn startup_error(e: WinstreamError) -> anyhow::Error {
    match e.user_hint() {
        Some(hint) => anyhow::anyhow!("{}\n  hint: {}", e, hint),
        None => anyhow::Error::new(e).context("Failed to start server"),
    }
}
