//! Bridge supervision: one relay task per requested standard stream.

pub mod relay;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{RedirectConfig, StdStream};
use crate::endpoint::IpcEndpointFactory;
use crate::{AppError, Result};

use relay::{InwardRelay, OutwardRelay};

/// Start one bridge per requested stream and wait for all of them.
///
/// All bridges share `cancel` and finish only through cancellation or a
/// fatal configuration defect. The supervisor never short-circuits: it
/// joins the full set, fires `done`, and only then surfaces the first
/// fatal error.
///
/// # Errors
///
/// Returns `AppError::Config` immediately when no streams were
/// requested (no bridges are started); otherwise the first fatal error
/// any bridge ended with.
pub async fn run_all(
    config: RedirectConfig,
    cancel: CancellationToken,
    done: oneshot::Sender<()>,
) -> Result<()> {
    let endpoints = config.endpoints();
    if endpoints.is_empty() {
        return Err(AppError::Config(
            "no standard streams to redirect; pass --out, --in, or --err".into(),
        ));
    }

    let mut handles = Vec::with_capacity(endpoints.len());
    for (stream, name) in endpoints {
        info!(endpoint = %name, %stream, "starting bridge");
        handles.push(spawn_bridge(stream, name, cancel.clone()));
    }

    let mut first_failure: Option<AppError> = None;
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(%err, "bridge terminated with fatal error");
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
            Err(err) => {
                error!(%err, "bridge task failed to join");
                if first_failure.is_none() {
                    first_failure = Some(AppError::Internal(err.to_string()));
                }
            }
        }
    }

    let _ = done.send(());
    info!("all bridges finished");
    first_failure.map_or(Ok(()), Err)
}

/// Construct and spawn the relay variant for one stream.
///
/// stdout and stderr are fed from their endpoints (a client's writes
/// become this process's output); stdin feeds its endpoint (this
/// process's input flows out to the client).
fn spawn_bridge(
    stream: StdStream,
    name: String,
    cancel: CancellationToken,
) -> JoinHandle<Result<()>> {
    let endpoints = IpcEndpointFactory::new(name.clone());
    match stream {
        StdStream::Stdout => {
            tokio::spawn(InwardRelay::new(name, endpoints, tokio::io::stdout).run(cancel))
        }
        StdStream::Stderr => {
            tokio::spawn(InwardRelay::new(name, endpoints, tokio::io::stderr).run(cancel))
        }
        StdStream::Stdin => {
            tokio::spawn(OutwardRelay::new(name, endpoints, tokio::io::stdin).run(cancel))
        }
    }
}
