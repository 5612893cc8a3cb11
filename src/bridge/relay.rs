//! Per-stream bridge cores: accept one client, relay bytes, repeat.
//!
//! Two relay variants fix the copy direction at construction time, so no
//! direction value is switched on at runtime: [`InwardRelay`] feeds a
//! local sink from the endpoint (stdout, stderr) and [`OutwardRelay`]
//! feeds the endpoint from a local source (stdin).
//!
//! Cycles are strictly sequential per bridge: a new endpoint is bound
//! only after the previous one has been dropped.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::endpoint::{Endpoint, EndpointFactory};
use crate::{AppError, Result};

/// Delay before rebinding after a failed cycle, so an endpoint that
/// keeps failing to bind cannot spin the loop hot.
const RETRY_DELAY: Duration = Duration::from_millis(250);

/// How one bridge cycle ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum CycleEnd {
    /// The client closed or the relayed stream hit EOF; accept the next
    /// client on a fresh endpoint.
    Disconnected,
    /// Cancellation observed; do not start another cycle.
    Cancelled,
}

/// Bridge relaying bytes from a named endpoint into a local sink.
///
/// Used for stdout and stderr: whatever a connected client writes to the
/// endpoint is written to the local stream. The sink thunk is invoked
/// once per cycle so every connection gets a fresh handle.
pub struct InwardRelay<E, F> {
    name: String,
    endpoints: E,
    sink: F,
}

impl<E, F, W> InwardRelay<E, F>
where
    E: EndpointFactory,
    F: FnMut() -> W,
    W: AsyncWrite + Unpin,
{
    /// Create a bridge feeding `sink` from the endpoint named `name`.
    pub fn new(name: impl Into<String>, endpoints: E, sink: F) -> Self {
        Self {
            name: name.into(),
            endpoints,
            sink,
        }
    }

    /// Run the accept/relay loop until cancellation fires.
    ///
    /// Per-cycle I/O failures are logged and retried with a fresh
    /// endpoint; cancellation is a clean exit.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the endpoint name can never bind.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        while !cancel.is_cancelled() {
            match self.cycle(&cancel).await {
                Ok(CycleEnd::Disconnected) => {}
                Ok(CycleEnd::Cancelled) => break,
                Err(err @ AppError::Config(_)) => return Err(err),
                Err(err) => {
                    warn!(endpoint = %self.name, %err, "failed to redirect stream");
                    if retry_pause(&cancel).await {
                        break;
                    }
                }
            }
        }
        info!(endpoint = %self.name, "finished redirecting");
        Ok(())
    }

    async fn cycle(&mut self, cancel: &CancellationToken) -> Result<CycleEnd> {
        let mut endpoint = self.endpoints.bind()?;
        info!(endpoint = %self.name, "waiting for client");

        let mut conn = tokio::select! {
            () = cancel.cancelled() => return Ok(CycleEnd::Cancelled),
            conn = endpoint.accept() => conn?,
        };
        info!(endpoint = %self.name, "client connected");

        let mut sink = (self.sink)();
        info!(endpoint = %self.name, "redirecting stream");

        tokio::select! {
            () = cancel.cancelled() => Ok(CycleEnd::Cancelled),
            copied = tokio::io::copy(&mut conn, &mut sink) => {
                let bytes = copied.map_err(|err| AppError::Relay(err.to_string()))?;
                info!(endpoint = %self.name, bytes, "client disconnected");
                Ok(CycleEnd::Disconnected)
            }
        }
    }
}

/// Bridge relaying bytes from a local source out to a named endpoint.
///
/// Used for stdin: whatever arrives on the local stream is written to
/// the connected client. The source thunk is invoked once per cycle so
/// every connection gets a fresh handle.
pub struct OutwardRelay<E, F> {
    name: String,
    endpoints: E,
    source: F,
}

impl<E, F, R> OutwardRelay<E, F>
where
    E: EndpointFactory,
    F: FnMut() -> R,
    R: AsyncRead + Unpin,
{
    /// Create a bridge feeding the endpoint named `name` from `source`.
    pub fn new(name: impl Into<String>, endpoints: E, source: F) -> Self {
        Self {
            name: name.into(),
            endpoints,
            source,
        }
    }

    /// Run the accept/relay loop until cancellation fires.
    ///
    /// Per-cycle I/O failures are logged and retried with a fresh
    /// endpoint; cancellation is a clean exit.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the endpoint name can never bind.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        while !cancel.is_cancelled() {
            match self.cycle(&cancel).await {
                Ok(CycleEnd::Disconnected) => {}
                Ok(CycleEnd::Cancelled) => break,
                Err(err @ AppError::Config(_)) => return Err(err),
                Err(err) => {
                    warn!(endpoint = %self.name, %err, "failed to redirect stream");
                    if retry_pause(&cancel).await {
                        break;
                    }
                }
            }
        }
        info!(endpoint = %self.name, "finished redirecting");
        Ok(())
    }

    async fn cycle(&mut self, cancel: &CancellationToken) -> Result<CycleEnd> {
        let mut endpoint = self.endpoints.bind()?;
        info!(endpoint = %self.name, "waiting for client");

        let mut conn = tokio::select! {
            () = cancel.cancelled() => return Ok(CycleEnd::Cancelled),
            conn = endpoint.accept() => conn?,
        };
        info!(endpoint = %self.name, "client connected");

        let mut source = (self.source)();
        info!(endpoint = %self.name, "redirecting stream");

        tokio::select! {
            () = cancel.cancelled() => Ok(CycleEnd::Cancelled),
            copied = tokio::io::copy(&mut source, &mut conn) => {
                let bytes = copied.map_err(|err| AppError::Relay(err.to_string()))?;
                info!(endpoint = %self.name, bytes, "client disconnected");
                Ok(CycleEnd::Disconnected)
            }
        }
    }
}

/// Wait out the retry delay; `true` when cancellation fired during it.
async fn retry_pause(cancel: &CancellationToken) -> bool {
    tokio::select! {
        () = cancel.cancelled() => true,
        () = tokio::time::sleep(RETRY_DELAY) => false,
    }
}
