#![forbid(unsafe_code)]

//! Redirect a process's standard streams to named IPC endpoints.
//!
//! Each requested stream (stdout, stdin, stderr) gets its own bridge: a
//! loop that publishes a named endpoint, accepts a single client, relays
//! bytes between the connection and the local stream, then republishes
//! the endpoint for the next client. An external client can therefore
//! attach to a running process's console-equivalent streams by name
//! instead of inheriting handles at spawn time.

pub mod bridge;
pub mod config;
pub mod endpoint;
pub mod errors;

pub use config::RedirectConfig;
pub use errors::{AppError, Result};
