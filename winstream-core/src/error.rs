//! Error types for winstream

use thiserror::Error;

/// Result type alias using WinstreamError
pub type Result<T> = std::result::Result<T, WinstreamError>;

/// Main error type for winstream operations
#[derive(Debug, Error)]
pub enum WinstreamError {
    /// No visible window matches the configured filter
    #[error("No window matching '{0}' found")]
    WindowNotFound(String),

    /// The window exists but could not be measured
    #[error("Geometry error for window {window}: {message}")]
    Geometry {
        /// Window identifier that was queried
        window: String,
        /// What went wrong
        message: String,
    },

    /// The capture subprocess could not be started
    #[error("Launch error: {0}")]
    Launch(String),

    /// Read or write failure after a session was running
    #[error("Stream error: {0}")]
    Stream(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Viewer template could not be loaded or rendered
    #[error("Template error: {0}")]
    Template(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<WinstreamError>,
    },
}

impl WinstreamError {
    /// Create a window-not-found error for a filter
    pub fn not_found(filter: impl Into<String>) -> Self {
        Self::WindowNotFound(filter.into())
    }

    /// Create a geometry error
    pub fn geometry(window: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Geometry {
            window: window.into(),
            message: message.into(),
        }
    }

    /// Create a launch error
    pub fn launch(msg: impl Into<String>) -> Self {
        Self::Launch(msg.into())
    }

    /// Create a stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping context wrappers
    pub fn root(&self) -> &WinstreamError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stable tag for structured logs
    pub fn kind(&self) -> &'static str {
        match self.root() {
            Self::WindowNotFound(_) => "not_found",
            Self::Geometry { .. } => "geometry",
            Self::Launch(_) => "launch",
            Self::Stream(_) => "stream",
            Self::Config(_) => "config",
            Self::Template(_) => "template",
            Self::Io(_) => "io",
            Self::WithContext { .. } => unreachable!("root() never returns a context wrapper"),
        }
    }

    /// Whether this error is scoped to a single stream request.
    ///
    /// Per-request errors are reported to the client and the server keeps
    /// running; everything else is a startup failure.
    pub fn is_per_request(&self) -> bool {
        matches!(
            self.root(),
            Self::WindowNotFound(_) | Self::Geometry { .. } | Self::Launch(_) | Self::Stream(_)
        )
    }

    /// Short human-readable body sent to the HTTP client
    pub fn client_message(&self) -> String {
        match self.root() {
            Self::WindowNotFound(filter) => format!("No window matching '{}' found", filter),
            Self::Geometry { .. } => "Failed to get window dimensions".to_string(),
            Self::Launch(_) => "Failed to start capture".to_string(),
            Self::Stream(_) => "Stream error".to_string(),
            _ => "Internal server error".to_string(),
        }
    }

    /// Hint for the operator on how to fix the problem
    pub fn user_hint(&self) -> Option<&'static str> {
        match self.root() {
            Self::WindowNotFound(_) => Some(
                "Run 'winstream list' to see visible windows and check that DISPLAY points at the right X server",
            ),
            Self::Geometry { .. } => {
                Some("The window may be minimized or was closed; make sure it is mapped and visible")
            }
            Self::Launch(_) => Some("Check that ffmpeg is installed and built with x11grab support"),
            Self::Config(_) => Some("Check your config.toml or command-line flags"),
            Self::Template(_) => Some("Check the --template path and that it contains {{stream_path}}"),
            _ => None,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}
