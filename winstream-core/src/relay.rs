//! Encoder → client byte relay
//!
//! The relay copies the capture process's output to a [`StreamSink`] in
//! bounded chunks, flushing after every write so each multipart part reaches
//! the browser as soon as it exists. It never inspects the bytes.
//!
//! The loop ends on the first of:
//! - end of stream or a read error from the encoder
//! - a write/flush error on the sink, or the sink reporting it is closed
//! - server shutdown
//!
//! Whatever ends it, [`relay`] stops the capture session before returning.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, trace, warn};

use crate::capture::CaptureSession;
use crate::error::{Result, WinstreamError};
use crate::shutdown::ShutdownListener;

/// Destination of relayed bytes
#[async_trait]
pub trait StreamSink: Send {
    /// Write one chunk. An error means the peer is gone.
    async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Push buffered bytes to the peer
    async fn flush(&mut self) -> io::Result<()>;

    /// Resolves once the sink knows the peer has gone away.
    ///
    /// Sinks that can only detect this by writing never resolve.
    async fn closed(&mut self) {
        std::future::pending::<()>().await
    }
}

/// Sink over any async writer
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> StreamSink for WriterSink<W> {
    async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.writer.write_all(chunk).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().await
    }
}

/// Why a relay stopped
#[derive(Debug)]
pub enum StopReason {
    /// The encoder closed its output (exited, or the display went away)
    UpstreamClosed,
    /// Reading the encoder's output failed
    UpstreamFailed(io::Error),
    /// The client disconnected or a write to it failed
    ClientDisconnected(io::Error),
    /// The server is shutting down
    Shutdown,
}

impl StopReason {
    /// Whether the encoder side ended the relay
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::UpstreamClosed | Self::UpstreamFailed(_))
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpstreamClosed => write!(f, "encoder closed its output"),
            Self::UpstreamFailed(e) => write!(f, "encoder read failed: {}", e),
            Self::ClientDisconnected(e) => write!(f, "client disconnected: {}", e),
            Self::Shutdown => write!(f, "server shutting down"),
        }
    }
}

/// Result of one relay run
#[derive(Debug)]
pub struct RelayOutcome {
    pub reason: StopReason,
    /// Bytes delivered to the sink
    pub bytes: u64,
    /// Chunks delivered to the sink
    pub chunks: u64,
}

impl RelayOutcome {
    fn new(reason: StopReason, bytes: u64, chunks: u64) -> Self {
        Self {
            reason,
            bytes,
            chunks,
        }
    }

    /// Client disconnects and shutdown are normal endings; an encoder that
    /// stops producing is a stream error.
    pub fn into_result(self) -> Result<u64> {
        match self.reason {
            StopReason::ClientDisconnected(_) | StopReason::Shutdown => Ok(self.bytes),
            reason => Err(WinstreamError::stream(reason.to_string())),
        }
    }
}

fn client_gone() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "client closed the connection")
}

/// Copy `reader` to `sink` until one side ends. Does not touch the process.
pub async fn pump<R, S>(
    reader: &mut R,
    sink: &mut S,
    chunk_size: usize,
    shutdown: &mut ShutdownListener,
) -> RelayOutcome
where
    R: AsyncRead + Unpin,
    S: StreamSink + ?Sized,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut bytes = 0u64;
    let mut chunks = 0u64;

    loop {
        let read = tokio::select! {
            biased;
            _ = shutdown.recv() => {
                return RelayOutcome::new(StopReason::Shutdown, bytes, chunks);
            }
            _ = sink.closed() => {
                return RelayOutcome::new(StopReason::ClientDisconnected(client_gone()), bytes, chunks);
            }
            read = reader.read(&mut buf) => read,
        };

        let n = match read {
            Ok(0) => return RelayOutcome::new(StopReason::UpstreamClosed, bytes, chunks),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return RelayOutcome::new(StopReason::UpstreamFailed(e), bytes, chunks),
        };

        // A slow client can hold the write indefinitely; shutdown still wins.
        let written = tokio::select! {
            biased;
            _ = shutdown.recv() => {
                return RelayOutcome::new(StopReason::Shutdown, bytes, chunks);
            }
            written = async {
                sink.write_chunk(&buf[..n]).await?;
                sink.flush().await
            } => written,
        };
        if let Err(e) = written {
            return RelayOutcome::new(StopReason::ClientDisconnected(e), bytes, chunks);
        }

        bytes += n as u64;
        chunks += 1;
        trace!(n, bytes, "Relayed chunk");
    }
}

/// Relay a session's output to `sink`, then stop the session.
///
/// The session is stopped on every path, including when stopping fails;
/// that failure is logged and does not change the outcome.
pub async fn relay<S>(
    session: &mut CaptureSession,
    sink: &mut S,
    chunk_size: usize,
    mut shutdown: ShutdownListener,
) -> RelayOutcome
where
    S: StreamSink + ?Sized,
{
    let id = session.id();
    debug!(session = %id, chunk_size, "Relay started");

    let outcome = match session.take_output() {
        Some(mut output) => pump(&mut output, sink, chunk_size, &mut shutdown).await,
        None => RelayOutcome::new(
            StopReason::UpstreamFailed(io::Error::other("capture output already taken")),
            0,
            0,
        ),
    };

    if let Err(e) = session.stop().await {
        warn!(session = %id, error = %e, "Failed to stop capture process");
    }

    info!(
        session = %id,
        reason = %outcome.reason,
        bytes = outcome.bytes,
        chunks = outcome.chunks,
        "Relay finished"
    );
    outcome
}
