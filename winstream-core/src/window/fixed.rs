//! Deterministic window provider

use async_trait::async_trait;
use super::WindowQuery;
use crate::error::{Result, WinstreamError};
use crate::types::{WindowGeometry, WindowHandle};

/// A fixed set of windows, matched by exact (case-sensitive) substring.
///
/// Used by tests and for running the server without an X display.
#[derive(Debug, Default)]
pub struct FixedWindows {
    windows: Vec<(WindowHandle, WindowGeometry)>,
    failure: Option<String>,
}

impl FixedWindows {
    /// Create an empty desktop
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every query fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Add a window; enumeration order is insertion order
    pub fn with_window(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        geometry: WindowGeometry,
    ) -> Self {
        self.windows.push((WindowHandle::new(id, name), geometry));
        self
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(std::io::Error::other(message.clone()).into()),
            None => Ok(()),
        }
    }

    fn find(&self, id: &str) -> Option<&(WindowHandle, WindowGeometry)> {
        self.windows.iter().find(|(handle, _)| handle.id == id)
    }
}

#[async_trait]
impl WindowQuery for FixedWindows {
    async fn search(&self, filter: &str) -> Result<Vec<String>> {
        self.check()?;
        Ok(self
            .windows
            .iter()
            .filter(|(handle, _)| handle.name.contains(filter))
            .map(|(handle, _)| handle.id.clone())
            .collect())
    }

    async fn window_name(&self, id: &str) -> Result<String> {
        self.check()?;
        self.find(id)
            .map(|(handle, _)| handle.name.clone())
            .ok_or_else(|| WinstreamError::not_found(id))
    }

    async fn geometry(&self, id: &str) -> Result<WindowGeometry> {
        self.check()?;
        self.find(id)
            .map(|(_, geometry)| *geometry)
            .ok_or_else(|| WinstreamError::geometry(id, "no such window"))
    }
}
