//! Integration tests for relay teardown
//!
//! Every way a relay can end must leave the capture process stopped and
//! reaped.

mod mocks;

use mocks::ScriptLauncher;
use std::time::Duration;
use winstream_core::capture::{CaptureRequest, Launcher};
use winstream_core::relay::{relay, StopReason, WriterSink};
use winstream_core::server::ChannelSink;
use winstream_core::{CaptureSession, Shutdown};

const WAIT: Duration = Duration::from_secs(5);
const CHUNK: usize = 64 * 1024;

fn launch(launcher: &ScriptLauncher) -> CaptureSession {
    let request = CaptureRequest::new(mocks::firefox_geometry(), ":99");
    launcher.launch(&request).expect("test program should start")
}

#[tokio::test]
async fn test_write_failure_stops_encoder() {
    let launcher = ScriptLauncher::endless();
    let mut session = launch(&launcher);
    let pid = session.pid().unwrap();

    // Client side of the connection is already gone
    let (writer, reader) = tokio::io::duplex(1024);
    drop(reader);
    let mut sink = WriterSink::new(writer);

    let shutdown = Shutdown::new();
    let outcome = tokio::time::timeout(WAIT, relay(&mut session, &mut sink, CHUNK, shutdown.listener()))
        .await
        .unwrap();

    assert!(matches!(outcome.reason, StopReason::ClientDisconnected(_)));
    assert!(session.exit_status().is_some());
    assert!(mocks::process_gone(pid));
}

#[tokio::test]
async fn test_read_failure_stops_encoder() {
    let launcher = ScriptLauncher::endless();
    let mut session = launch(&launcher);
    let pid = session.pid().unwrap();

    // Nothing left to read from
    drop(session.take_output());
    let mut sink = WriterSink::new(Vec::new());

    let shutdown = Shutdown::new();
    let outcome = tokio::time::timeout(WAIT, relay(&mut session, &mut sink, CHUNK, shutdown.listener()))
        .await
        .unwrap();

    assert!(matches!(outcome.reason, StopReason::UpstreamFailed(_)));
    assert_eq!(outcome.bytes, 0);
    assert!(session.exit_status().is_some());
    assert!(mocks::process_gone(pid));
}

#[tokio::test]
async fn test_encoder_exit_stops_relay() {
    let launcher = ScriptLauncher::once("abc");
    let mut session = launch(&launcher);
    let pid = session.pid().unwrap();
    let mut sink = WriterSink::new(Vec::new());

    let shutdown = Shutdown::new();
    let outcome = tokio::time::timeout(WAIT, relay(&mut session, &mut sink, CHUNK, shutdown.listener()))
        .await
        .unwrap();

    assert!(matches!(outcome.reason, StopReason::UpstreamClosed));
    assert!(outcome.reason.is_upstream());
    assert_eq!(outcome.bytes, 3);
    assert_eq!(sink.into_inner(), b"abc".to_vec());
    assert_eq!(outcome.into_result().unwrap_err().kind(), "stream");
    assert!(mocks::process_gone(pid));
}

#[tokio::test]
async fn test_closed_sink_noticed_while_encoder_is_silent() {
    let launcher = ScriptLauncher::silent();
    let mut session = launch(&launcher);
    let pid = session.pid().unwrap();

    let (mut sink, body) = ChannelSink::with_body();
    drop(body);

    let shutdown = Shutdown::new();
    let outcome = tokio::time::timeout(WAIT, relay(&mut session, &mut sink, CHUNK, shutdown.listener()))
        .await
        .expect("relay should not wait for the encoder to write");

    assert!(matches!(outcome.reason, StopReason::ClientDisconnected(_)));
    assert_eq!(outcome.bytes, 0);
    assert!(mocks::process_gone(pid));
}

#[tokio::test]
async fn test_shutdown_stops_running_relay() {
    let launcher = ScriptLauncher::silent();
    let mut session = launch(&launcher);
    let pid = session.pid().unwrap();

    let shutdown = Shutdown::new();
    let listener = shutdown.listener();
    let task = tokio::spawn(async move {
        let mut sink = WriterSink::new(Vec::new());
        let outcome = relay(&mut session, &mut sink, CHUNK, listener).await;
        (outcome, session.exit_status())
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.trigger();

    let (outcome, status) = tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
    assert!(matches!(outcome.reason, StopReason::Shutdown));
    assert!(outcome.into_result().is_ok());
    assert!(status.is_some());
    assert!(mocks::process_gone(pid));
}

#[tokio::test]
async fn test_stop_after_relay_is_idempotent() {
    let launcher = ScriptLauncher::endless();
    let mut session = launch(&launcher);

    let (writer, reader) = tokio::io::duplex(64);
    drop(reader);
    let mut sink = WriterSink::new(writer);
    let shutdown = Shutdown::new();
    relay(&mut session, &mut sink, CHUNK, shutdown.listener()).await;

    let first = session.exit_status().unwrap();
    let again = session.stop().await.unwrap();
    assert_eq!(first, again);
}

#[tokio::test]
async fn test_dropped_session_is_killed() {
    let launcher = ScriptLauncher::silent();
    let session = launch(&launcher);
    let pid = session.pid().unwrap();

    drop(session);

    assert!(mocks::wait_until_gone(pid, WAIT).await);
}

#[tokio::test]
async fn test_noisy_encoder_diagnostics_do_not_block_output() {
    // Several megabytes of diagnostics before the first frame byte
    let launcher = ScriptLauncher::new(
        "sh",
        &["-c", "head -c 4000000 /dev/zero | tr '\\0' 'x' >&2; printf abc"],
    );
    let mut session = launch(&launcher);
    let pid = session.pid().unwrap();
    let mut sink = WriterSink::new(Vec::new());

    let shutdown = Shutdown::new();
    let outcome = tokio::time::timeout(WAIT, relay(&mut session, &mut sink, CHUNK, shutdown.listener()))
        .await
        .expect("stderr output should not stall the relay");

    assert!(matches!(outcome.reason, StopReason::UpstreamClosed));
    assert_eq!(outcome.bytes, 3);
    assert_eq!(sink.into_inner(), b"abc".to_vec());
    assert!(mocks::process_gone(pid));
}
