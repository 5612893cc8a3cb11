#![forbid(unsafe_code)]

//! `stdrelay` — redirect this process's standard streams to named IPC
//! endpoints.
//!
//! Bootstraps configuration and logging, starts one bridge per requested
//! stream, and coordinates shutdown: an interrupt cancels every bridge
//! once, then the process waits a bounded grace window for in-flight
//! relays to unwind before exiting.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, EnvFilter};

use stdrelay::config::{Cli, RedirectConfig};
use stdrelay::{bridge, AppError, Result};

/// Bounded wait for in-flight relays to unwind after cancellation.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn main() -> Result<()> {
    let args = Cli::parse();
    let config = RedirectConfig::from_cli(args)?;
    init_tracing(config.log_file.as_deref())?;
    info!("stdrelay bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(config))
}

async fn run(config: RedirectConfig) -> Result<()> {
    let cancel = CancellationToken::new();
    let (done_tx, done_rx) = oneshot::channel();

    let mut supervisor = tokio::spawn(bridge::run_all(config, cancel.clone(), done_tx));

    tokio::select! {
        outcome = &mut supervisor => return flatten(outcome),
        () = shutdown_signal() => {
            info!("shutdown signal received");
            cancel.cancel();
        }
    }

    // Best-effort shutdown: wait for the completion latch, then exit
    // regardless.
    if tokio::time::timeout(SHUTDOWN_GRACE, done_rx).await.is_err() {
        warn!("bridges still running after grace window; exiting");
        supervisor.abort();
        return Ok(());
    }

    flatten(supervisor.await)
}

fn flatten(outcome: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    outcome.map_err(|err| AppError::Internal(format!("supervisor task failed: {err}")))?
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

/// Route log output to the configured file, or discard it entirely.
///
/// stdout and stderr belong to the relayed streams, so the subscriber
/// never writes to either of them.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = match log_file {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|err| {
                AppError::Config(format!("cannot create log file '{}': {err}", path.display()))
            })?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::sink),
    };

    fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))
}
