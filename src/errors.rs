//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all failure modes.
///
/// Only `Config` is fatal to a running bridge; `Endpoint` and `Relay`
/// failures are logged and retried with a fresh endpoint.
#[derive(Debug)]
pub enum AppError {
    /// CLI or endpoint-name validation failure; never retried.
    Config(String),
    /// Named endpoint creation or accept failure.
    Endpoint(String),
    /// I/O failure while relaying bytes to or from a connected client.
    Relay(String),
    /// Task join failure or other unexpected runtime condition.
    Internal(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Endpoint(msg) => write!(f, "endpoint: {msg}"),
            Self::Relay(msg) => write!(f, "relay: {msg}"),
            Self::Internal(msg) => write!(f, "internal: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}
