//! Winstream Core Library
//!
//! Stream a single X11 window to web browsers as Motion-JPEG.
//!
//! This library provides:
//! - Window lookup and geometry via xdotool/xwininfo
//! - One ffmpeg x11grab encoder per viewer, killed and reaped on disconnect
//! - An axum HTTP front serving a viewer page and a multipart stream
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Window Locate │───▶│ Geometry     │───▶│ Capture      │───▶│ Relay        │
//! │ (xdotool)     │    │ (xwininfo)   │    │ (ffmpeg)     │    │ (HTTP body)  │
//! └───────────────┘    └──────────────┘    └──────────────┘    └──────────────┘
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod relay;
pub mod server;
pub mod shutdown;
pub mod types;
pub mod window;

pub use capture::{CaptureRequest, CaptureSession, FfmpegLauncher, Launcher};
pub use config::{ConfigFile, StreamConfig};
pub use error::{Result, WinstreamError};
pub use pipeline::Pipeline;
pub use server::StreamServer;
pub use shutdown::{Shutdown, ShutdownListener};
pub use types::{SessionId, WindowGeometry, WindowHandle};
pub use window::{WindowQuery, X11Query};
