//! Mock infrastructure for testing
//!
//! Provides a scripted capture launcher backed by ordinary system programs,
//! a fixed desktop, and helpers for checking that capture processes were
//! reaped.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::process::Command;
use winstream_core::capture::{CaptureRequest, CaptureSession, Launcher};
use winstream_core::config::StreamConfig;
use winstream_core::window::FixedWindows;
use winstream_core::{Result, Shutdown, StreamServer, WindowGeometry};

/// Geometry of the Firefox window on the test desktop
pub fn firefox_geometry() -> WindowGeometry {
    WindowGeometry::new(100, 50, 1280, 720)
}

/// A small desktop: a terminal, Firefox, and a minimized window
pub fn desktop() -> FixedWindows {
    FixedWindows::new()
        .with_window("0x1a00003", "Terminal", WindowGeometry::new(0, 0, 800, 600))
        .with_window("0x2c00007", "Mozilla Firefox", firefox_geometry())
        .with_window("0x3e00001", "Minimized Player", WindowGeometry::new(0, 0, 0, 480))
}

/// Launcher that runs a fixed program instead of an encoder
pub struct ScriptLauncher {
    program: String,
    args: Vec<String>,
    launches: AtomicUsize,
    pids: Mutex<Vec<u32>>,
    requests: Mutex<Vec<CaptureRequest>>,
}

impl ScriptLauncher {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            launches: AtomicUsize::new(0),
            pids: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Endless output, like a running encoder
    pub fn endless() -> Self {
        Self::new("yes", &["frame"])
    }

    /// Writes `output` and exits
    pub fn once(output: &str) -> Self {
        Self::new("sh", &["-c", &format!("printf '%s' '{}'", output)])
    }

    /// Runs but never writes, like an encoder stuck on a dead display
    pub fn silent() -> Self {
        Self::new("sleep", &["30"])
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn pids(&self) -> Vec<u32> {
        self.pids.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<CaptureRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl Launcher for ScriptLauncher {
    fn launch(&self, request: &CaptureRequest) -> Result<CaptureSession> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        let session = CaptureSession::spawn(command)?.with_stop_timeout(Duration::from_secs(2));

        if let Some(pid) = session.pid() {
            self.pids.lock().unwrap().push(pid);
        }
        Ok(session)
    }
}

/// Build a server over the test desktop
pub fn server(config: StreamConfig, launcher: Arc<ScriptLauncher>) -> (StreamServer, Shutdown) {
    let shutdown = Shutdown::new();
    let server = StreamServer::new(config, Arc::new(desktop()), launcher, shutdown.listener())
        .expect("test config is valid");
    (server, shutdown)
}

/// Whether `pid` no longer exists. Zombies still count as existing, so
/// this only holds once the process has been reaped.
pub fn process_gone(pid: u32) -> bool {
    unsafe { libc::kill(pid as libc::pid_t, 0) != 0 }
}

/// Poll until `pid` is gone or `timeout` passes
pub async fn wait_until_gone(pid: u32, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if process_gone(pid) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Poll until `check` holds or `timeout` passes
pub async fn eventually(timeout: Duration, check: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while !check() {
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    true
}
