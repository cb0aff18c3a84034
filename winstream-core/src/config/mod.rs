//! Configuration types for winstream
//!
//! `StreamConfig` is built once at startup (config file, then command-line
//! overrides) and shared read-only with the HTTP front and every request.

mod file;

pub use file::{sample_config, CaptureSettings, ConfigFile, ServerSettings, ViewerSettings};

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, WinstreamError};

/// Default X display the capture and query tools talk to
pub const DEFAULT_DISPLAY: &str = ":99";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8181;

/// Default capture framerate
pub const DEFAULT_FRAMERATE: u32 = 60;

/// Multipart boundary emitted by ffmpeg's mpjpeg muxer
pub const DEFAULT_BOUNDARY: &str = "ffmpeg";

/// Bytes read from the encoder per relay iteration
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Default cap on simultaneous capture sessions
pub const DEFAULT_MAX_SESSIONS: u32 = 16;

/// Runtime configuration for the stream server
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    /// Window title substring to stream (empty matches any window)
    pub window_name: String,
    /// X display identifier (e.g. ":99")
    pub display: String,
    /// Address to bind
    pub bind: IpAddr,
    /// Port to bind
    pub port: u16,
    /// Capture framerate
    pub framerate: u32,
    /// MJPEG quantizer (1 = best, 31 = worst)
    pub quality: u8,
    /// Encoder pixel format
    pub pixel_format: String,
    /// Multipart boundary token, shared by the encoder and the response header
    pub boundary: String,
    /// Relay read size in bytes
    pub chunk_size: usize,
    /// Maximum simultaneous stream sessions
    pub max_sessions: u32,
    /// Deadline for each window/geometry query
    pub query_timeout: Duration,
    /// Deadline for reaping the encoder after kill
    pub stop_timeout: Duration,
    /// How long to wait for sessions to drain on shutdown
    pub shutdown_grace: Duration,
    /// Path to the ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// ffmpeg `-loglevel` value
    pub encoder_log_level: String,
    /// External viewer template (built-in page when unset)
    pub template_path: Option<PathBuf>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            window_name: String::new(),
            display: DEFAULT_DISPLAY.to_string(),
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            framerate: DEFAULT_FRAMERATE,
            quality: 1,
            pixel_format: "yuvj444p".to_string(),
            boundary: DEFAULT_BOUNDARY.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_sessions: DEFAULT_MAX_SESSIONS,
            query_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(3),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            encoder_log_level: "warning".to_string(),
            template_path: None,
        }
    }
}

impl StreamConfig {
    /// Create a config streaming the given window
    pub fn for_window(name: impl Into<String>) -> Self {
        Self {
            window_name: name.into(),
            ..Default::default()
        }
    }

    /// Set the X display
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }

    /// Set the listen port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the capture framerate
    pub fn with_framerate(mut self, framerate: u32) -> Self {
        self.framerate = framerate;
        self
    }

    /// Set the session cap
    pub fn with_max_sessions(mut self, max: u32) -> Self {
        self.max_sessions = max;
        self
    }

    /// Set the relay chunk size
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Use an external viewer template
    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    /// Socket address to listen on
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Content type for the stream endpoint
    pub fn content_type(&self) -> String {
        format!("multipart/x-mixed-replace; boundary={}", self.boundary)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.display.trim().is_empty() {
            return Err(WinstreamError::config("Display must not be empty"));
        }

        if !(1..=240).contains(&self.framerate) {
            return Err(WinstreamError::config(format!(
                "Framerate {} out of range (1-240)",
                self.framerate
            )));
        }

        if !(1..=31).contains(&self.quality) {
            return Err(WinstreamError::config(format!(
                "Quality {} out of range (1-31)",
                self.quality
            )));
        }

        if !is_boundary_token(&self.boundary) {
            return Err(WinstreamError::config(format!(
                "Invalid multipart boundary '{}'",
                self.boundary
            )));
        }

        if self.chunk_size == 0 {
            return Err(WinstreamError::config("Chunk size must be greater than zero"));
        }

        if self.max_sessions == 0 {
            return Err(WinstreamError::config("max_sessions must be at least 1"));
        }

        if self.query_timeout.is_zero() {
            return Err(WinstreamError::config("Query timeout must be greater than zero"));
        }

        if self.stop_timeout.is_zero() {
            return Err(WinstreamError::config("Stop timeout must be greater than zero"));
        }

        Ok(())
    }
}

/// RFC 2046 boundary usable unquoted in a header: 1-70 token characters
fn is_boundary_token(s: &str) -> bool {
    const EXTRA: &str = "'+_-.";
    !s.is_empty()
        && s.len() <= 70
        && s.chars().all(|c| c.is_ascii_alphanumeric() || EXTRA.contains(c))
}
