//! HTTP front
//!
//! Two routes:
//! - `GET /` returns the viewer page
//! - `GET /stream` starts a capture and streams it as
//!   `multipart/x-mixed-replace`
//!
//! Anything else is a 404. Each stream request owns its own encoder process;
//! a semaphore caps how many can run at once.

mod stream;
mod viewer;

pub use stream::ChannelSink;
pub use viewer::ViewerPage;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::capture::Launcher;
use crate::config::StreamConfig;
use crate::error::{Result, WinstreamError};
use crate::pipeline::Pipeline;
use crate::shutdown::ShutdownListener;
use crate::window::WindowQuery;

/// Path of the stream endpoint
pub const STREAM_PATH: &str = "/stream";

/// Shared state for request handlers
struct AppState {
    config: Arc<StreamConfig>,
    pipeline: Pipeline,
    viewer: ViewerPage,
    sessions: Arc<Semaphore>,
    shutdown: ShutdownListener,
}

/// The stream server
pub struct StreamServer {
    state: Arc<AppState>,
}

impl StreamServer {
    /// Build a server. Fails if the configuration is invalid or the viewer
    /// template cannot be rendered.
    pub fn new(
        config: StreamConfig,
        query: Arc<dyn WindowQuery>,
        launcher: Arc<dyn Launcher>,
        shutdown: ShutdownListener,
    ) -> Result<Self> {
        config.validate()?;
        let viewer = ViewerPage::render(&config)?;

        let config = Arc::new(config);
        let sessions = Arc::new(Semaphore::new(config.max_sessions as usize));
        let pipeline = Pipeline::new(config.clone(), query, launcher);

        Ok(Self {
            state: Arc::new(AppState {
                config,
                pipeline,
                viewer,
                sessions,
                shutdown,
            }),
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.state.config
    }

    /// Axum router for this server
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(viewer_page))
            .route(STREAM_PATH, get(stream::stream_window))
            .fallback(not_found)
            .with_state(self.state.clone())
    }

    /// Serve connections from `listener` until the listener fails
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        if let Ok(addr) = listener.local_addr() {
            info!(
                "Streaming '{}' from display {} on http://{}",
                self.state.config.window_name, self.state.config.display, addr
            );
        }

        axum::serve(listener, self.router())
            .await
            .map_err(|e| WinstreamError::Io(e).with_context("HTTP server error"))
    }

    /// Number of streams currently running
    pub fn active_sessions(&self) -> usize {
        self.state.config.max_sessions as usize - self.state.sessions.available_permits()
    }

    /// Wait for running streams to finish, up to `grace`.
    ///
    /// Returns `true` when every stream finished in time. Relays stop their
    /// encoders once shutdown is triggered, so this normally returns quickly.
    pub async fn drain(&self, grace: Duration) -> bool {
        let active = self.active_sessions();
        if active == 0 {
            return true;
        }

        info!(active, "Waiting for streams to stop");
        let all = self.state.config.max_sessions;
        // The pending acquire holds released permits until it is dropped
        let drained = tokio::time::timeout(grace, self.state.sessions.acquire_many(all))
            .await
            .is_ok();
        if !drained {
            warn!(
                remaining = self.active_sessions(),
                "Streams still running after {:?}",
                grace
            );
        }
        drained
    }
}

async fn viewer_page(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Html(state.viewer.body())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}
