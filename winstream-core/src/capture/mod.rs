//! Capture process management
//!
//! A [`Launcher`] turns a window geometry into a running [`CaptureSession`]:
//! an encoder subprocess whose stdout is the multipart MJPEG byte stream.
//! The session guarantees the process is killed and reaped on every exit
//! path.

mod ffmpeg;
mod session;

pub use ffmpeg::FfmpegLauncher;
pub use session::{CaptureSession, DEFAULT_STOP_TIMEOUT};

use crate::error::Result;
use crate::types::WindowGeometry;

/// What to capture: a screen rectangle on a display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    /// Absolute region to grab
    pub geometry: WindowGeometry,
    /// X display identifier
    pub display: String,
}

impl CaptureRequest {
    pub fn new(geometry: WindowGeometry, display: impl Into<String>) -> Self {
        Self {
            geometry,
            display: display.into(),
        }
    }
}

/// Starts capture subprocesses
pub trait Launcher: Send + Sync {
    /// Spawn an encoder for `request`.
    ///
    /// Fails with a launch error when the program is missing or refuses to
    /// start.
    fn launch(&self, request: &CaptureRequest) -> Result<CaptureSession>;
}
