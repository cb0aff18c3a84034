//! Core types for winstream
//!
//! Everything here is request-scoped: a window is located, measured and
//! captured once per stream request and then discarded.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for capture session IDs
static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifier for one capture session, used to correlate log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Allocate a new unique session ID
    pub fn new() -> Self {
        Self(SESSION_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Get the raw value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// An identified on-screen window
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle {
    /// Opaque identifier used by the windowing system
    pub id: String,
    /// Display name (title) of the window
    pub name: String,
}

impl WindowHandle {
    /// Create a new window handle
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.id, self.name)
    }
}

/// Absolute screen rectangle of a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WindowGeometry {
    /// Absolute upper-left X
    pub x: i32,
    /// Absolute upper-left Y
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl WindowGeometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether both dimensions are non-zero
    pub fn is_measurable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Capture source selector for a display, e.g. `:99+100,50`
    pub fn source_selector(&self, display: &str) -> String {
        format!("{}+{},{}", display, self.x, self.y)
    }

    /// Clip size, e.g. `1280x720`
    pub fn clip_size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl std::fmt::Display for WindowGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn test_geometry_selector_and_clip() {
        let geometry = WindowGeometry::new(100, 50, 1280, 720);
        assert_eq!(geometry.source_selector(":99"), ":99+100,50");
        assert_eq!(geometry.clip_size(), "1280x720");
        assert!(geometry.is_measurable());
    }

    #[test]
    fn test_geometry_zero_dimension_not_measurable() {
        assert!(!WindowGeometry::new(0, 0, 0, 720).is_measurable());
        assert!(!WindowGeometry::new(0, 0, 1280, 0).is_measurable());
        assert!(!WindowGeometry::default().is_measurable());
    }

    #[test]
    fn test_negative_origin_selector() {
        let geometry = WindowGeometry::new(-10, -4, 640, 480);
        assert_eq!(geometry.source_selector(":0"), ":0+-10,-4");
    }
}
