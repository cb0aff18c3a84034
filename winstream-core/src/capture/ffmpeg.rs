//! ffmpeg x11grab → MJPEG launcher

use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::{CaptureRequest, CaptureSession, Launcher};
use crate::config::StreamConfig;
use crate::error::Result;

/// Launches ffmpeg grabbing a screen region into a multipart MJPEG stream on stdout.
///
/// Encoding favours fidelity over bandwidth: quantizer 1, optimal Huffman
/// tables, full-chroma pixel format.
#[derive(Debug, Clone)]
pub struct FfmpegLauncher {
    program: PathBuf,
    framerate: u32,
    quality: u8,
    pixel_format: String,
    boundary: String,
    log_level: String,
    stop_timeout: Duration,
}

impl FfmpegLauncher {
    /// Launcher settings taken from the stream configuration
    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            program: config.ffmpeg_path.clone(),
            framerate: config.framerate,
            quality: config.quality,
            pixel_format: config.pixel_format.clone(),
            boundary: config.boundary.clone(),
            log_level: config.encoder_log_level.clone(),
            stop_timeout: config.stop_timeout,
        }
    }

    /// Command-line arguments for one capture
    pub fn args(&self, request: &CaptureRequest) -> Vec<String> {
        let geometry = &request.geometry;
        let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-nostats", "-loglevel"]
            .map(String::from)
            .to_vec();
        args.push(self.log_level.clone());

        args.extend(["-f", "x11grab", "-video_size"].map(String::from));
        args.push(geometry.clip_size());
        args.push("-framerate".to_string());
        args.push(self.framerate.to_string());
        args.push("-i".to_string());
        args.push(geometry.source_selector(&request.display));

        args.extend(["-c:v", "mjpeg", "-q:v"].map(String::from));
        args.push(self.quality.to_string());
        args.extend(["-huffman", "optimal", "-pix_fmt"].map(String::from));
        args.push(self.pixel_format.clone());

        args.extend(["-f", "mpjpeg", "-boundary_tag"].map(String::from));
        args.push(self.boundary.clone());
        args.push("-".to_string());
        args
    }

    fn command(&self, request: &CaptureRequest) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(self.args(request))
            .env("DISPLAY", &request.display);
        command
    }
}

impl Launcher for FfmpegLauncher {
    fn launch(&self, request: &CaptureRequest) -> Result<CaptureSession> {
        debug!(
            program = %self.program.display(),
            args = ?self.args(request),
            "Launching encoder"
        );
        Ok(CaptureSession::spawn(self.command(request))?.with_stop_timeout(self.stop_timeout))
    }
}
