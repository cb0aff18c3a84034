//! Per-request capture pipeline
//!
//! Locate → resolve → launch. Every stream request runs the whole sequence
//! on its own; nothing is shared between requests except the read-only
//! configuration and the providers.

use std::sync::Arc;
use tracing::{debug, info};

use crate::capture::{CaptureRequest, CaptureSession, Launcher};
use crate::config::StreamConfig;
use crate::error::Result;
use crate::window::{locate, resolve, WindowQuery};

/// Builds a running capture session for the configured window
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<StreamConfig>,
    query: Arc<dyn WindowQuery>,
    launcher: Arc<dyn Launcher>,
}

impl Pipeline {
    pub fn new(
        config: Arc<StreamConfig>,
        query: Arc<dyn WindowQuery>,
        launcher: Arc<dyn Launcher>,
    ) -> Self {
        Self {
            config,
            query,
            launcher,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Find the window, measure it and start the encoder.
    ///
    /// A failing stage stops the sequence; nothing is launched unless the
    /// window was found and has non-zero dimensions.
    pub async fn start(&self) -> Result<CaptureSession> {
        let filter = self.config.window_name.as_str();
        debug!(filter, display = %self.config.display, "Starting capture pipeline");

        let handle = locate(self.query.as_ref(), filter).await?;
        let geometry = resolve(self.query.as_ref(), &handle).await?;

        let request = CaptureRequest::new(geometry, self.config.display.clone());
        let session = self.launcher.launch(&request)?;

        info!(
            session = %session.id(),
            window = %handle.id,
            name = %handle.name,
            %geometry,
            "{} stream started",
            self.config.window_name
        );
        Ok(session)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("window_name", &self.config.window_name)
            .field("display", &self.config.display)
            .finish_non_exhaustive()
    }
}
