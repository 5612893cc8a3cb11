//! Unit tests for `AppError` display formats.

use stdrelay::AppError;

#[test]
fn config_error_display_starts_with_config_prefix() {
    let err = AppError::Config("bad name".into());
    assert_eq!(err.to_string(), "config: bad name");
}

#[test]
fn endpoint_error_display_starts_with_endpoint_prefix() {
    let err = AppError::Endpoint("create failed".into());
    assert_eq!(err.to_string(), "endpoint: create failed");
}

#[test]
fn relay_error_display_starts_with_relay_prefix() {
    let err = AppError::Relay("broken pipe".into());
    assert_eq!(err.to_string(), "relay: broken pipe");
}

#[test]
fn internal_error_display_starts_with_internal_prefix() {
    let err = AppError::Internal("join failed".into());
    assert_eq!(err.to_string(), "internal: join failed");
}

#[test]
fn variants_with_same_message_are_distinct() {
    let endpoint = AppError::Endpoint("x".into());
    let relay = AppError::Relay("x".into());
    assert_ne!(endpoint.to_string(), relay.to_string());
}

#[test]
fn error_implements_std_error_trait() {
    fn assert_error<E: std::error::Error>(_err: &E) {}
    assert_error(&AppError::Config("test".into()));
}
