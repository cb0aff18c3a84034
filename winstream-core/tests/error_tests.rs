//! Integration tests for error handling

use winstream_core::error::{ResultExt, WinstreamError};

#[test]
fn test_error_context_chaining() {
    let base = WinstreamError::launch("ffmpeg not found");
    let with_context = base.with_context("Starting stream session");

    let msg = format!("{}", with_context);
    assert!(msg.contains("Starting stream session"));
    assert!(msg.contains("ffmpeg not found"));
}

#[test]
fn test_context_preserves_classification() {
    let err = WinstreamError::geometry("0x2c00007", "zero dimensions (0x480)")
        .with_context("Resolving window")
        .with_context("Handling /stream");

    assert_eq!(err.kind(), "geometry");
    assert!(err.is_per_request());
    assert_eq!(err.client_message(), "Failed to get window dimensions");
    assert!(err.user_hint().is_some());
}

#[test]
fn test_result_ext_context() {
    let result: Result<(), WinstreamError> = Err(WinstreamError::not_found("Firefox"));
    let err = result.context("Locating window").unwrap_err();

    assert!(format!("{}", err).contains("Locating window"));
    assert_eq!(err.client_message(), "No window matching 'Firefox' found");
}

#[test]
fn test_not_found_and_geometry_are_distinguishable() {
    let not_found = WinstreamError::not_found("Firefox");
    let geometry = WinstreamError::geometry("0x1", "vanished");

    assert_ne!(not_found.kind(), geometry.kind());
    assert_ne!(not_found.client_message(), geometry.client_message());
}

#[test]
fn test_client_messages() {
    assert_eq!(
        WinstreamError::launch("x").client_message(),
        "Failed to start capture"
    );
    assert_eq!(WinstreamError::stream("x").client_message(), "Stream error");
    assert_eq!(
        WinstreamError::config("x").client_message(),
        "Internal server error"
    );
}

#[test]
fn test_startup_errors_are_not_per_request() {
    assert!(!WinstreamError::config("bad port").is_per_request());
    assert!(!WinstreamError::template("missing").is_per_request());

    let io: WinstreamError = std::io::Error::other("disk").into();
    assert_eq!(io.kind(), "io");
    assert!(!io.is_per_request());
}

#[test]
fn test_user_hints() {
    let hint = WinstreamError::not_found("x").user_hint().unwrap();
    assert!(hint.contains("winstream list"));

    let hint = WinstreamError::launch("x").user_hint().unwrap();
    assert!(hint.contains("ffmpeg"));

    assert!(WinstreamError::stream("x").user_hint().is_none());
}
