//! TCP acceptor.
//!
//! # Responsibilities
//! - Bind the listening socket (fatal on failure)
//! - Accept connections under a short deadline so the loop never stalls
//! - Spawn one independent session task per accepted connection
//!
//! # Design Decisions
//! - Accept errors, including an elapsed accept deadline, are retried silently
//! - The listening socket is owned here and shared with nothing else

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use crate::config::{ListenerConfig, ProxyConfig};
use crate::error::{ProxyError, ProxyResult};
use crate::net::connection::SessionTracker;
use crate::observability::metrics;
use crate::proxy::handler;

/// Accepts client connections and hands each to a session task.
pub struct Listener {
    inner: TcpListener,
    accept_timeout: Duration,
    sessions: SessionTracker,
}

impl Listener {
    /// Bind to the configured address.
    pub async fn bind(config: &ListenerConfig) -> ProxyResult<Self> {
        let bind_error = |source: io::Error| ProxyError::Bind {
            address: config.bind_address.clone(),
            source,
        };

        let addr: SocketAddr = config
            .bind_address
            .parse()
            .map_err(|e| bind_error(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

        let inner = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = inner.local_addr().map_err(bind_error)?;

        tracing::debug!(
            address = %local_addr,
            accept_timeout_ms = config.accept_timeout_ms,
            "Listener bound"
        );

        Ok(Self {
            inner,
            accept_timeout: config.accept_timeout(),
            sessions: SessionTracker::new(),
        })
    }

    /// Wait at most the accept deadline for the next connection.
    pub async fn accept(&self) -> ProxyResult<(TcpStream, SocketAddr)> {
        match tokio::time::timeout(self.accept_timeout, self.inner.accept()).await {
            Ok(Ok(accepted)) => Ok(accepted),
            Ok(Err(e)) => Err(ProxyError::Accept(e)),
            Err(_) => Err(ProxyError::Accept(io::Error::new(
                io::ErrorKind::TimedOut,
                "accept deadline elapsed",
            ))),
        }
    }

    /// Accept forever, spawning a session per connection.
    pub async fn run(self, config: Arc<ProxyConfig>) {
        loop {
            let (stream, peer_addr) = match self.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::trace!(error = %e, "Accept retry");
                    continue;
                }
            };

            metrics::record_accept();
            tracing::debug!(
                peer_addr = %peer_addr,
                active_sessions = self.sessions.active_count(),
                "Connection accepted"
            );

            let guard = self.sessions.track();
            let config = Arc::clone(&config);
            tokio::spawn(async move {
                handler::serve(stream, peer_addr, config).await;
                drop(guard);
            });
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, io::Error> {
        self.inner.local_addr()
    }

    pub fn active_sessions(&self) -> u64 {
        self.sessions.active_count()
    }
}
