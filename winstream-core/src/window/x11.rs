//! X11 window queries via `xdotool` and `xwininfo`

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, trace};

use super::{parse_geometry, WindowQuery};
use crate::error::{Result, WinstreamError};
use crate::types::WindowGeometry;

/// Window query provider backed by the X11 command-line tools
#[derive(Debug, Clone)]
pub struct X11Query {
    /// Value passed as `DISPLAY`
    display: String,
    /// Deadline for each tool invocation
    timeout: Duration,
    xdotool: PathBuf,
    xwininfo: PathBuf,
}

impl X11Query {
    /// Create a provider for the given display
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            timeout: Duration::from_secs(5),
            xdotool: PathBuf::from("xdotool"),
            xwininfo: PathBuf::from("xwininfo"),
        }
    }

    /// Set the per-query deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the tool binaries
    pub fn with_tools(mut self, xdotool: impl Into<PathBuf>, xwininfo: impl Into<PathBuf>) -> Self {
        self.xdotool = xdotool.into();
        self.xwininfo = xwininfo.into();
        self
    }

    async fn run(&self, program: &Path, args: &[&str]) -> Result<Output> {
        trace!(?program, ?args, display = %self.display, "Running window query");

        let mut command = Command::new(program);
        command
            .args(args)
            .env("DISPLAY", &self.display)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(WinstreamError::Io(e)
                .with_context(format!("Failed to run {}", program.display()))),
            Err(_) => Err(WinstreamError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("{} timed out after {:?}", program.display(), self.timeout),
            ))),
        }
    }
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

fn failed(program: &str, output: &Output) -> WinstreamError {
    WinstreamError::Io(std::io::Error::other(format!(
        "{} exited with {}: {}",
        program,
        output.status,
        stderr_text(output)
    )))
}

/// Escape a literal substring for xdotool's POSIX extended regex
pub(crate) fn literal_pattern(filter: &str) -> String {
    const SPECIAL: &str = r"\.[]()*+?{}|^$";
    let mut pattern = String::with_capacity(filter.len() * 2);
    for c in filter.chars() {
        if SPECIAL.contains(c) {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern
}

#[async_trait]
impl WindowQuery for X11Query {
    async fn search(&self, filter: &str) -> Result<Vec<String>> {
        let pattern = literal_pattern(filter);
        let output = self
            .run(
                &self.xdotool,
                &["search", "--onlyvisible", "--name", "--", pattern.as_str()],
            )
            .await?;

        let ids: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        // xdotool exits non-zero with no output when nothing matches
        if !output.status.success() && ids.is_empty() && !output.stderr.is_empty() {
            return Err(failed("xdotool search", &output));
        }

        debug!(filter, matches = ids.len(), "xdotool search finished");
        Ok(ids)
    }

    async fn window_name(&self, id: &str) -> Result<String> {
        let output = self.run(&self.xdotool, &["getwindowname", id]).await?;
        if !output.status.success() {
            return Err(failed("xdotool getwindowname", &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn geometry(&self, id: &str) -> Result<WindowGeometry> {
        let output = self.run(&self.xwininfo, &["-id", id]).await?;
        if !output.status.success() {
            return Err(failed("xwininfo", &output));
        }
        Ok(parse_geometry(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_pattern_escapes_regex() {
        assert_eq!(literal_pattern("Firefox"), "Firefox");
        assert_eq!(literal_pattern("a.b (1)"), r"a\.b \(1\)");
        assert_eq!(literal_pattern("x*y+z?"), r"x\*y\+z\?");
        assert_eq!(literal_pattern(""), "");
    }

    #[tokio::test]
    async fn test_missing_tool_is_error() {
        let query = X11Query::new(":99").with_tools("/nonexistent/xdotool", "/nonexistent/xwininfo");
        assert!(query.search("Firefox").await.is_err());
        assert!(query.geometry("0x1").await.is_err());
    }

    #[tokio::test]
    async fn test_empty_output_is_no_match() {
        // `true` prints nothing and succeeds
        let query = X11Query::new(":99").with_tools("true", "true");
        assert!(query.search("Firefox").await.unwrap().is_empty());
        assert_eq!(query.geometry("0x1").await.unwrap(), WindowGeometry::default());
    }

    #[tokio::test]
    async fn test_silent_failure_is_no_match() {
        // `false` exits 1 with no output, like xdotool with no matches
        let query = X11Query::new(":99").with_tools("false", "false");
        assert!(query.search("Firefox").await.unwrap().is_empty());
        assert!(query.geometry("0x1").await.is_err());
    }

    #[tokio::test]
    async fn test_leading_dash_filter_is_not_an_option() {
        // `echo` hands the argument list back as a single "window id"
        let query = X11Query::new(":99").with_tools("echo", "true");
        let ids = query.search("-bash").await.unwrap();
        assert_eq!(ids, vec!["search --onlyvisible --name -- -bash".to_string()]);
    }

    #[tokio::test]
    #[ignore = "requires an X display with xdotool"]
    async fn test_list_real_display() {
        let display = std::env::var("DISPLAY").unwrap_or_else(|_| ":0".to_string());
        let query = X11Query::new(display);
        let windows = crate::window::list_all(&query).await.unwrap();
        println!("{:?}", windows);
    }
}
