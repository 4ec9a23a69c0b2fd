//! Connection Dispatcher
//!
//! Accepts client connections and hands each one to its own detached task.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::proxy::{handle_connection, ProxyState};

/// Pause after a failed accept before trying again
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Accept loop for the proxy's listening socket.
///
/// Holds no per-connection state: each accepted stream moves into a spawned
/// task that owns it until the response is complete.
pub struct Dispatcher {
    listener: TcpListener,
    state: ProxyState,
}

impl Dispatcher {
    /// Binds the listening socket.
    pub async fn bind(addr: SocketAddr, state: ProxyState) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::from_listener(listener, state))
    }

    /// Wraps an already bound listener.
    pub fn from_listener(listener: TcpListener, state: ProxyState) -> Self {
        Self { listener, state }
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever.
    pub async fn run(self) {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` completes.
    ///
    /// Connections already handed off keep running to completion. Accept
    /// failures are logged and retried after a short pause.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Dispatcher stopped accepting connections");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!(%peer, "Accepted connection");
                        tokio::spawn(handle_connection(stream, peer, self.state.clone()));
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }
    }
}
