//! Window geometry resolution

use regex::Regex;
use std::sync::OnceLock;
use tracing::{info, warn};

use super::WindowQuery;
use crate::error::{Result, WinstreamError};
use crate::types::{WindowGeometry, WindowHandle};

/// Measure a window. Fails when the query fails or either dimension is zero
/// (typically a minimized window, or one destroyed since it was located).
pub async fn resolve(query: &dyn WindowQuery, handle: &WindowHandle) -> Result<WindowGeometry> {
    let geometry = query.geometry(&handle.id).await.map_err(|e| {
        warn!(window = %handle.id, error = %e, "Geometry query failed");
        WinstreamError::geometry(&handle.id, format!("query failed: {}", e))
    })?;

    if !geometry.is_measurable() {
        warn!(window = %handle.id, %geometry, "Window has zero dimensions");
        return Err(WinstreamError::geometry(
            &handle.id,
            format!("zero dimensions ({}x{})", geometry.width, geometry.height),
        ));
    }

    info!(window = %handle.id, %geometry, "Resolved window geometry");
    Ok(geometry)
}

struct Labels {
    x: Regex,
    y: Regex,
    width: Regex,
    height: Regex,
}

fn labels() -> &'static Labels {
    static LABELS: OnceLock<Labels> = OnceLock::new();
    LABELS.get_or_init(|| Labels {
        x: label(r"Absolute upper-left X:"),
        y: label(r"Absolute upper-left Y:"),
        width: label(r"Width:"),
        height: label(r"Height:"),
    })
}

// Label at the start of a line (after indentation), then the value token.
fn label(prefix: &str) -> Regex {
    match Regex::new(&format!(r"(?m)^[ \t]*{}[ \t]*(\S+)", regex::escape(prefix))) {
        Ok(re) => re,
        Err(e) => unreachable!("static geometry pattern is valid: {}", e),
    }
}

fn field<T: std::str::FromStr + Default>(re: &Regex, text: &str) -> T {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or_default()
}

/// Parse `xwininfo`-style text.
///
/// The four labelled fields may appear anywhere; a missing or malformed
/// field is left at zero.
pub fn parse_geometry(text: &str) -> WindowGeometry {
    let labels = labels();
    WindowGeometry {
        x: field(&labels.x, text),
        y: field(&labels.y, text),
        width: field(&labels.width, text),
        height: field(&labels.height, text),
    }
}
