//! Viewer page
//!
//! The page is rendered once at startup; it only depends on the configured
//! window name. Templates use `{{title}}`, `{{window_name}}` and
//! `{{stream_path}}` placeholders, and must reference the stream path.

use bytes::Bytes;
use tracing::debug;

use super::STREAM_PATH;
use crate::config::StreamConfig;
use crate::error::{Result, WinstreamError};

/// Rendered viewer HTML
#[derive(Debug, Clone)]
pub struct ViewerPage {
    html: Bytes,
}

impl ViewerPage {
    /// Render the configured template, or the built-in page
    pub fn render(config: &StreamConfig) -> Result<Self> {
        let template = match &config.template_path {
            Some(path) => {
                debug!("Loading viewer template from {:?}", path);
                std::fs::read_to_string(path).map_err(|e| {
                    WinstreamError::template(format!("Failed to read {:?}: {}", path, e))
                })?
            }
            None => DEFAULT_TEMPLATE.to_string(),
        };

        Self::from_template(&template, &config.window_name)
    }

    /// Render a template string for a window name
    pub fn from_template(template: &str, window_name: &str) -> Result<Self> {
        let title = escape_html(&format!("{} Stream", window_name));
        let name = escape_html(window_name);
        let values = [
            ("title", title.as_str()),
            ("window_name", name.as_str()),
            ("stream_path", STREAM_PATH),
        ];

        let (html, used) = fill(template, &values)?;
        if !used.contains(&"stream_path") {
            return Err(WinstreamError::template(
                "Template does not reference {{stream_path}}",
            ));
        }

        Ok(Self {
            html: Bytes::from(html),
        })
    }

    /// Rendered page body
    pub fn body(&self) -> Bytes {
        self.html.clone()
    }
}

/// Single-pass placeholder substitution; returns the placeholders used
fn fill<'a>(template: &str, values: &[(&'a str, &str)]) -> Result<(String, Vec<&'a str>)> {
    let mut out = String::with_capacity(template.len());
    let mut used = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| WinstreamError::template("Unclosed '{{' in template"))?;
        let key = after[..end].trim();

        let (name, value) = values
            .iter()
            .find(|(name, _)| *name == key)
            .ok_or_else(|| WinstreamError::template(format!("Unknown placeholder '{}'", key)))?;

        out.push_str(value);
        used.push(*name);
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok((out, used))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Built-in viewer page
const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{title}}</title>
    <style>
        html, body {
            margin: 0;
            height: 100%;
            background: #111;
            color: #ddd;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
        }
        body {
            display: flex;
            flex-direction: column;
            align-items: center;
            justify-content: center;
        }
        img {
            max-width: 100%;
            max-height: calc(100% - 2em);
            object-fit: contain;
            background: #000;
        }
        .status {
            height: 2em;
            line-height: 2em;
            font-size: 13px;
            color: #888;
        }
    </style>
</head>
<body>
    <img id="stream" src="{{stream_path}}" alt="{{window_name}}">
    <div class="status" id="status">{{window_name}}</div>
    <script>
        const img = document.getElementById('stream');
        const status = document.getElementById('status');
        const name = status.textContent;

        // The stream ends when the window or encoder goes away; reconnect.
        img.onerror = () => {
            status.textContent = name + ' (reconnecting...)';
            setTimeout(() => {
                img.src = '{{stream_path}}?t=' + Date.now();
            }, 1000);
        };
        img.onload = () => {
            status.textContent = name;
        };
    </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn text(page: &ViewerPage) -> String {
        String::from_utf8(page.body().to_vec()).unwrap()
    }

    #[test]
    fn test_default_page_embeds_stream() {
        let page = ViewerPage::render(&StreamConfig::for_window("Firefox")).unwrap();
        let html = text(&page);
        assert!(html.contains("<title>Firefox Stream</title>"));
        assert!(html.contains(r#"src="/stream""#));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_window_name_is_escaped() {
        let page = ViewerPage::from_template(
            "<h1>{{window_name}}</h1><img src=\"{{stream_path}}\">",
            "<script>alert(1)</script>",
        )
        .unwrap();
        let html = text(&page);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_placeholder_in_window_name_not_expanded() {
        let page = ViewerPage::from_template("{{window_name}} {{stream_path}}", "{{stream_path}}").unwrap();
        assert_eq!(text(&page), "{{stream_path}} /stream");
    }

    #[test]
    fn test_template_without_stream_path_rejected() {
        let err = ViewerPage::from_template("<p>{{title}}</p>", "Firefox").unwrap_err();
        assert_eq!(err.kind(), "template");
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        assert!(ViewerPage::from_template("{{stream_path}} {{nope}}", "x").is_err());
        assert!(ViewerPage::from_template("{{stream_path}} {{title", "x").is_err());
    }

    #[test]
    fn test_template_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<img src=\"{{{{stream_path}}}}\" title=\"{{{{title}}}}\">").unwrap();

        let config = StreamConfig::for_window("Terminal").with_template(file.path());
        let page = ViewerPage::render(&config).unwrap();
        assert_eq!(text(&page), r#"<img src="/stream" title="Terminal Stream">"#);
    }

    #[test]
    fn test_missing_template_file_is_error() {
        let config = StreamConfig::for_window("x").with_template("/nonexistent/index.html");
        let err = ViewerPage::render(&config).unwrap_err();
        assert!(!err.is_per_request());
    }
}
