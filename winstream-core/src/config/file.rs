//! Configuration file loading and merging
//!
//! Loads user configuration from `~/.config/winstream/config.toml`

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::StreamConfig;
use crate::error::{Result, WinstreamError};

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Listener and session settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Capture and encoder settings
    #[serde(default)]
    pub capture: CaptureSettings,

    /// Viewer page settings
    #[serde(default)]
    pub viewer: ViewerSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address to bind
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum simultaneous stream sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u32,

    /// Seconds to wait for sessions to drain on shutdown
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

/// Capture settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Window title substring to stream
    #[serde(default)]
    pub window: String,

    /// X display
    #[serde(default = "default_display")]
    pub display: String,

    /// Capture framerate
    #[serde(default = "default_framerate")]
    pub framerate: u32,

    /// MJPEG quantizer (1-31, lower is better)
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Path to ffmpeg
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,

    /// ffmpeg log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds allowed for each window query
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,

    /// Seconds allowed to reap the encoder after kill
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,
}

/// Viewer page settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerSettings {
    /// External HTML template
    #[serde(default)]
    pub template: Option<PathBuf>,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    super::DEFAULT_PORT
}

fn default_max_sessions() -> u32 {
    super::DEFAULT_MAX_SESSIONS
}

fn default_shutdown_grace() -> u64 {
    3
}

fn default_display() -> String {
    super::DEFAULT_DISPLAY.to_string()
}

fn default_framerate() -> u32 {
    super::DEFAULT_FRAMERATE
}

fn default_quality() -> u8 {
    1
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_log_level() -> String {
    "warning".to_string()
}

fn default_query_timeout() -> u64 {
    5
}

fn default_stop_timeout() -> u64 {
    5
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_sessions: default_max_sessions(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            window: String::new(),
            display: default_display(),
            framerate: default_framerate(),
            quality: default_quality(),
            ffmpeg: default_ffmpeg(),
            log_level: default_log_level(),
            query_timeout_secs: default_query_timeout(),
            stop_timeout_secs: default_stop_timeout(),
        }
    }
}

impl ConfigFile {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("winstream").join("config.toml")
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("winstream")
                .join("config.toml")
        } else {
            PathBuf::from("/etc/winstream/config.toml")
        }
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| WinstreamError::config(format!("Failed to read config file: {}", e)))?;

        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| WinstreamError::config(format!("Failed to parse config file: {}", e)))?;

        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Build the runtime configuration from this file
    pub fn to_stream_config(&self) -> Result<StreamConfig> {
        let bind: IpAddr = self.server.bind.parse().map_err(|_| {
            WinstreamError::config(format!("Invalid bind address '{}'", self.server.bind))
        })?;

        Ok(StreamConfig {
            window_name: self.capture.window.clone(),
            display: self.capture.display.clone(),
            bind,
            port: self.server.port,
            framerate: self.capture.framerate,
            quality: self.capture.quality,
            max_sessions: self.server.max_sessions,
            query_timeout: Duration::from_secs(self.capture.query_timeout_secs),
            stop_timeout: Duration::from_secs(self.capture.stop_timeout_secs),
            shutdown_grace: Duration::from_secs(self.server.shutdown_grace_secs),
            ffmpeg_path: self.capture.ffmpeg.clone(),
            encoder_log_level: self.capture.log_level.clone(),
            template_path: self.viewer.template.clone(),
            ..StreamConfig::default()
        })
    }
}

/// Generate a sample configuration file
pub fn sample_config() -> String {
    r#"# winstream configuration

[server]
# Address and port for the viewer page and /stream endpoint
bind = "0.0.0.0"
port = 8181

# Maximum simultaneous stream sessions (each runs its own ffmpeg)
max_sessions = 16

# Seconds to wait for running streams to stop on shutdown
shutdown_grace_secs = 3

[capture]
# Window title substring to stream (empty = first visible window)
window = ""

# X display the window lives on
display = ":99"

# Capture framerate
framerate = 60

# MJPEG quantizer: 1 (best) to 31 (smallest)
quality = 1

# ffmpeg binary and its log level
ffmpeg = "ffmpeg"
log_level = "warning"

# Deadlines for xdotool/xwininfo queries and for reaping ffmpeg
query_timeout_secs = 5
stop_timeout_secs = 5

[viewer]
# Optional HTML template; must contain {{stream_path}}
# template = "/path/to/index.html"
"#
    .to_string()
}
