//! Stream endpoint
//!
//! The handler starts a capture session, returns the multipart response
//! headers right away and hands the session to a relay task that feeds the
//! response body through a bounded channel. When the client goes away hyper
//! drops the body, the channel closes and the relay stops the encoder.

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

use super::AppState;
use crate::config::StreamConfig;
use crate::relay::{relay, StreamSink};

/// Chunks buffered between the relay and the HTTP connection
const BODY_BUFFER: usize = 4;

/// [`StreamSink`] feeding an HTTP response body
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

impl ChannelSink {
    /// Create a sink and the response body it feeds
    pub fn with_body() -> (Self, Body) {
        let (tx, rx) = mpsc::channel(BODY_BUFFER);
        let chunks = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        });
        (Self { tx }, Body::from_stream(chunks))
    }
}

#[async_trait]
impl StreamSink for ChannelSink {
    async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.tx
            .send(Ok(Bytes::copy_from_slice(chunk)))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response body dropped"))
    }

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    async fn closed(&mut self) {
        self.tx.closed().await
    }
}

/// `GET /stream`
pub(super) async fn stream_window(State(state): State<Arc<AppState>>) -> Response {
    let Ok(permit) = state.sessions.clone().try_acquire_owned() else {
        warn!(
            max_sessions = state.config.max_sessions,
            "Rejecting stream request: session limit reached"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many active streams").into_response();
    };

    let mut session = match state.pipeline.start().await {
        Ok(session) => session,
        Err(e) => {
            error!(
                filter = %state.config.window_name,
                kind = e.kind(),
                "Failed to start stream: {}",
                e
            );
            return (StatusCode::INTERNAL_SERVER_ERROR, e.client_message()).into_response();
        }
    };

    let (mut sink, body) = ChannelSink::with_body();
    let chunk_size = state.config.chunk_size;
    let shutdown = state.shutdown.clone();

    tokio::spawn(async move {
        let _permit = permit;
        let outcome = relay(&mut session, &mut sink, chunk_size, shutdown).await;
        if let Err(e) = outcome.into_result() {
            warn!(session = %session.id(), "Stream ended: {}", e);
        }
    });

    multipart_response(&state.config, body)
}

fn multipart_response(config: &StreamConfig, body: Body) -> Response {
    (
        [
            (header::CONTENT_TYPE, config.content_type()),
            (
                header::CACHE_CONTROL,
                "no-cache, no-store, must-revalidate".to_string(),
            ),
            (header::PRAGMA, "no-cache".to_string()),
            (header::CONNECTION, "close".to_string()),
        ],
        body,
    )
        .into_response()
}
