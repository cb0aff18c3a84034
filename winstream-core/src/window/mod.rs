//! Window lookup on the X display
//!
//! All windowing-system access goes through the [`WindowQuery`] trait:
//! - [`X11Query`] shells out to `xdotool` and `xwininfo`
//! - [`FixedWindows`] returns fixed values for tests and dry runs
//!
//! [`locate`] and [`resolve`] are the two pipeline stages built on top.

mod fixed;
mod geometry;
mod x11;

pub use fixed::FixedWindows;
pub use geometry::{parse_geometry, resolve};
pub use x11::X11Query;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{Result, WinstreamError};
use crate::types::{WindowGeometry, WindowHandle};

/// Name shown for windows whose title cannot be read
pub const UNKNOWN_WINDOW_NAME: &str = "Unknown";

/// Capability interface over the windowing system
#[async_trait]
pub trait WindowQuery: Send + Sync {
    /// IDs of visible windows whose title contains `filter`, in the
    /// windowing system's enumeration order.
    ///
    /// An empty result is not an error.
    async fn search(&self, filter: &str) -> Result<Vec<String>>;

    /// Title of a window
    async fn window_name(&self, id: &str) -> Result<String>;

    /// Raw geometry of a window; fields that could not be read are zero
    async fn geometry(&self, id: &str) -> Result<WindowGeometry>;
}

/// Find the first visible window whose title contains `filter`.
///
/// The order among several matches is whatever the windowing system
/// enumerates first and is not stable across platforms. A failing query
/// is reported as not-found, with the cause logged.
pub async fn locate(query: &dyn WindowQuery, filter: &str) -> Result<WindowHandle> {
    let ids = match query.search(filter).await {
        Ok(ids) => ids,
        Err(e) => {
            warn!(filter, error = %e, "Window search failed");
            return Err(WinstreamError::not_found(filter));
        }
    };

    let Some(id) = ids.into_iter().find(|id| !id.trim().is_empty()) else {
        debug!(filter, "No visible window matches");
        return Err(WinstreamError::not_found(filter));
    };

    let name = query
        .window_name(&id)
        .await
        .unwrap_or_else(|_| UNKNOWN_WINDOW_NAME.to_string());

    info!(filter, window = %id, name = %name, "Located window");
    Ok(WindowHandle::new(id, name))
}

/// List every visible window, for startup diagnostics.
///
/// Windows whose name cannot be read are reported as "Unknown".
pub async fn list_all(query: &dyn WindowQuery) -> Result<Vec<WindowHandle>> {
    let ids = query.search("").await?;
    let mut windows = Vec::with_capacity(ids.len());

    for id in ids.into_iter().filter(|id| !id.trim().is_empty()) {
        let name = match query.window_name(&id).await {
            Ok(name) => name,
            Err(e) => {
                debug!(window = %id, error = %e, "Could not read window name");
                UNKNOWN_WINDOW_NAME.to_string()
            }
        };
        windows.push(WindowHandle::new(id, name));
    }

    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> FixedWindows {
        FixedWindows::new()
            .with_window("0x1", "Terminal", WindowGeometry::new(0, 0, 800, 600))
            .with_window("0x2", "Mozilla Firefox", WindowGeometry::new(100, 50, 1280, 720))
            .with_window("0x3", "Firefox Settings", WindowGeometry::new(10, 10, 400, 300))
    }

    #[tokio::test]
    async fn test_locate_returns_first_match() {
        let query = desktop();
        let handle = locate(&query, "Firefox").await.unwrap();
        assert_eq!(handle.id, "0x2");
        assert_eq!(handle.name, "Mozilla Firefox");
    }

    #[tokio::test]
    async fn test_locate_no_match() {
        let query = desktop();
        let err = locate(&query, "Chromium").await.unwrap_err();
        assert!(matches!(err, WinstreamError::WindowNotFound(ref f) if f == "Chromium"));
    }

    #[tokio::test]
    async fn test_locate_query_failure_is_not_found() {
        let query = FixedWindows::failing("cannot open display");
        let err = locate(&query, "Firefox").await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_locate_empty_filter_matches_first_window() {
        let query = desktop();
        let handle = locate(&query, "").await.unwrap();
        assert_eq!(handle.id, "0x1");
    }

    #[tokio::test]
    async fn test_locate_is_case_sensitive_substring() {
        let query = desktop();
        assert!(locate(&query, "firefox").await.is_err());
        assert!(locate(&query, "fox Sett").await.is_ok());
    }

    #[tokio::test]
    async fn test_list_all() {
        let query = desktop();
        let windows = list_all(&query).await.unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[2].to_string(), "[0x3] Firefox Settings");
    }

    #[tokio::test]
    async fn test_list_all_empty_desktop() {
        let query = FixedWindows::new();
        assert!(list_all(&query).await.unwrap().is_empty());
    }
}
