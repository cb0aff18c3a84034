//! A running capture subprocess

use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::error::{Result, WinstreamError};
use crate::types::SessionId;

/// Default deadline for reaping a killed capture process
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// One encoder subprocess bound to one stream request.
///
/// The session owns the child and its pipes. [`CaptureSession::stop`] kills
/// and reaps it; dropping an unstopped session kills it as well, so a
/// cancelled request cannot leave the encoder running.
#[derive(Debug)]
pub struct CaptureSession {
    id: SessionId,
    child: Child,
    pid: Option<u32>,
    /// Encoded output; taken by the relay
    output: Option<ChildStdout>,
    stop_timeout: Duration,
    exit_status: Option<ExitStatus>,
}

impl CaptureSession {
    /// Spawn `command` with piped output and start draining its stderr.
    ///
    /// Stdin is closed and stdout/stderr are piped regardless of how the
    /// command was configured.
    pub fn spawn(mut command: Command) -> Result<Self> {
        let program = command
            .as_std()
            .get_program()
            .to_string_lossy()
            .into_owned();

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => WinstreamError::launch(format!("{} not found", program)),
            ErrorKind::PermissionDenied => {
                WinstreamError::launch(format!("{} is not executable", program))
            }
            _ => WinstreamError::launch(format!("Failed to start {}: {}", program, e)),
        })?;

        let id = SessionId::new();
        let pid = child.id();

        let output = child
            .stdout
            .take()
            .ok_or_else(|| WinstreamError::launch("Capture process stdout was not piped"))?;

        if let Some(stderr) = child.stderr.take() {
            drain_diagnostics(id, stderr);
        }

        info!(session = %id, pid, program = %program, "Capture process started");

        Ok(Self {
            id,
            child,
            pid,
            output: Some(output),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            exit_status: None,
        })
    }

    /// Set how long `stop` waits for the process to exit after the kill
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// OS process ID, as recorded at spawn
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Take the encoded output stream. Returns `None` once taken.
    pub fn take_output(&mut self) -> Option<ChildStdout> {
        self.output.take()
    }

    /// Exit status, once the process has been reaped
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// Whether the process is still running. Reaps it if it has exited.
    pub fn is_running(&mut self) -> bool {
        if self.exit_status.is_some() {
            return false;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.exit_status = Some(status);
                false
            }
            Ok(None) => true,
            Err(_) => false,
        }
    }

    /// Kill the process and wait for it to exit.
    ///
    /// Idempotent: later calls return the recorded exit status. Safe to call
    /// after the process has exited on its own. Waiting is bounded by the
    /// stop timeout.
    pub async fn stop(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.exit_status {
            return Ok(status);
        }

        // Close our end first so an encoder blocked on a full pipe wakes up.
        self.output.take();

        if let Some(status) = self.child.try_wait()? {
            debug!(session = %self.id, %status, "Capture process already exited");
            self.exit_status = Some(status);
            return Ok(status);
        }

        if let Err(e) = self.child.start_kill() {
            // Lost a race with a natural exit; wait() below still reaps it.
            debug!(session = %self.id, error = %e, "Kill signal not delivered");
        }

        match tokio::time::timeout(self.stop_timeout, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!(session = %self.id, %status, "Capture process stopped");
                self.exit_status = Some(status);
                Ok(status)
            }
            Ok(Err(e)) => Err(WinstreamError::stream(format!(
                "Failed to reap capture process: {}",
                e
            ))),
            Err(_) => Err(WinstreamError::stream(format!(
                "Capture process did not exit within {:?}",
                self.stop_timeout
            ))),
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.exit_status.is_none() {
            warn!(session = %self.id, "Capture session dropped without stop, killing process");
            let _ = self.child.start_kill();
        }
    }
}

/// Log the encoder's stderr line by line on a detached task.
///
/// The task ends when the pipe closes; nothing waits on it.
fn drain_diagnostics(id: SessionId, stderr: ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).split(b'\n');
        loop {
            match lines.next_segment().await {
                Ok(Some(line)) => {
                    let line = String::from_utf8_lossy(&line);
                    let line = line.trim_end();
                    if !line.is_empty() {
                        info!(target: "winstream::encoder", session = %id, "{}", line);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(session = %id, error = %e, "Encoder diagnostics read failed");
                    break;
                }
            }
        }
        debug!(session = %id, "Encoder diagnostics closed");
    });
}
