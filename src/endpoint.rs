//! Named-endpoint lifecycle adapter over the `interprocess` crate.
//!
//! Listens on a named pipe (Windows) or Unix domain socket (Linux/macOS).
//! Every bridge cycle binds a brand-new endpoint so a disconnected client
//! can never corrupt the next client's session; dropping the value is the
//! unconditional disposal path.

use std::future::Future;

use interprocess::local_socket::{tokio::prelude::*, GenericNamespaced, ListenerOptions};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{AppError, Result};

/// One live named endpoint, waiting for a single client.
///
/// Owned by the bridge cycle that bound it and dropped on every exit
/// path of that cycle, whether the relay ended normally, failed, or was
/// cancelled.
pub trait Endpoint: Send {
    /// Byte stream exchanged with the connected client.
    type Conn: AsyncRead + AsyncWrite + Send + Unpin;

    /// Wait for exactly one client to connect.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Endpoint` when the underlying accept fails;
    /// the caller treats this as transient and rebinds.
    fn accept(&mut self) -> impl Future<Output = Result<Self::Conn>> + Send;
}

/// Binds endpoints under a fixed name, never reusing a prior OS handle.
pub trait EndpointFactory: Send {
    /// Endpoint type produced by [`EndpointFactory::bind`].
    type Endpoint: Endpoint;

    /// Publish a fresh endpoint under this factory's name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the name itself can never bind
    /// (fatal) and `AppError::Endpoint` for transient creation failures.
    fn bind(&mut self) -> Result<Self::Endpoint>;
}

/// Factory for local-socket endpoints in the platform's namespaced
/// namespace (named pipes on Windows, abstract sockets on Linux).
#[derive(Debug, Clone)]
pub struct IpcEndpointFactory {
    name: String,
}

impl IpcEndpointFactory {
    /// Create a factory binding endpoints under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl EndpointFactory for IpcEndpointFactory {
    type Endpoint = IpcEndpoint;

    fn bind(&mut self) -> Result<IpcEndpoint> {
        let listener_name = self
            .name
            .clone()
            .to_ns_name::<GenericNamespaced>()
            .map_err(|err| {
                AppError::Config(format!("invalid endpoint name '{}': {err}", self.name))
            })?;

        let listener = ListenerOptions::new()
            .name(listener_name)
            .create_tokio()
            .map_err(|err| {
                AppError::Endpoint(format!("failed to create endpoint '{}': {err}", self.name))
            })?;

        Ok(IpcEndpoint {
            name: self.name.clone(),
            listener,
        })
    }
}

/// A live local-socket endpoint; the OS handle is released on drop.
pub struct IpcEndpoint {
    name: String,
    listener: interprocess::local_socket::tokio::Listener,
}

impl Endpoint for IpcEndpoint {
    type Conn = interprocess::local_socket::tokio::Stream;

    async fn accept(&mut self) -> Result<Self::Conn> {
        self.listener.accept().await.map_err(|err| {
            AppError::Endpoint(format!("accept on endpoint '{}' failed: {err}", self.name))
        })
    }
}
