//! Connection handler.
//!
//! # Responsibilities
//! - Sniff the request line and resolve the origin
//! - Dial the origin and open the session's capture files
//! - Relay client → origin, then origin → client, each teed into its capture
//! - Report the outcome (log level by error kind, session metrics)
//!
//! # Design Decisions
//! - Every stream and file is owned by the `Session`; any early return drops
//!   (and so closes) all of them
//! - Nothing is dialed and nothing is written to disk unless the request line parses
//! - The two directions run one after the other

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::config::ProxyConfig;
use crate::error::{Direction, ProxyError, ProxyResult};
use crate::net::{arm_deadline, Conn, CorrelationId};
use crate::observability::metrics;
use crate::proxy::capture::Capture;
use crate::relay::{relay, RelayStats, Tee};
use crate::request::{sniffer, Rewind, SniffedRequest};

/// What a completed session did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: CorrelationId,
    pub request: SniffedRequest,
    /// Client → origin.
    pub upstream: RelayStats,
    /// Origin → client.
    pub downstream: RelayStats,
}

/// One client connection after a successful dial.
struct Session<S> {
    id: CorrelationId,
    request: SniffedRequest,
    client: Rewind<Conn<S>>,
    origin: Conn<TcpStream>,
    capture: Capture,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn relay_request(&mut self, config: &ProxyConfig) -> ProxyResult<RelayStats> {
        let options = config.relay.options(Direction::Request, &config.timeouts);
        let mut sink = Tee::new(&mut self.origin, &mut self.capture.request, config.timeouts.tee());
        relay(&mut self.client, &mut sink, &options)
            .await
            .map_err(|source| ProxyError::Relay {
                direction: Direction::Request,
                source,
            })
    }

    async fn relay_response(&mut self, config: &ProxyConfig) -> ProxyResult<RelayStats> {
        let options = config.relay.options(Direction::Response, &config.timeouts);
        let mut sink = Tee::new(
            self.client.get_mut(),
            &mut self.capture.response,
            config.timeouts.tee(),
        );
        relay(&mut self.origin, &mut sink, &options)
            .await
            .map_err(|source| ProxyError::Relay {
                direction: Direction::Response,
                source,
            })
    }

    async fn run(mut self, config: &ProxyConfig) -> ProxyResult<SessionSummary> {
        let relayed = self.relay_both(config).await;

        if let Err(e) = self.capture.finish().await {
            tracing::warn!(id = %self.id, error = %e, "Failed to flush capture files");
        }

        let (upstream, downstream) = relayed?;
        Ok(SessionSummary {
            id: self.id,
            request: self.request,
            upstream,
            downstream,
        })
    }

    async fn relay_both(&mut self, config: &ProxyConfig) -> ProxyResult<(RelayStats, RelayStats)> {
        let upstream = self.relay_request(config).await?;
        metrics::record_relay(Direction::Request, &upstream);

        let downstream = self.relay_response(config).await?;
        metrics::record_relay(Direction::Response, &downstream);

        Ok((upstream, downstream))
    }
}

/// Drive one client connection from request line to closed streams.
pub async fn handle_connection<S>(stream: S, config: &ProxyConfig) -> ProxyResult<SessionSummary>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let mut client = Conn::new(stream);
    arm_deadline(&mut client, config.timeouts.sniff());

    let prefix = sniffer::collect(&mut client).await;
    let request = sniffer::inspect(&prefix)?;

    let id = CorrelationId::new();
    tracing::info!(
        id = %id,
        method = %request.method,
        destination = %request.destination,
        "Handling request for {}.",
        request.uri
    );

    let origin = dial(&request.destination, config.timeouts.connect()).await?;
    let capture = Capture::create(&config.capture.directory, id).await?;

    let session = Session {
        id,
        request,
        client: Rewind::new(prefix, client),
        origin: Conn::new(origin),
        capture,
    };
    session.run(config).await
}

async fn dial(destination: &str, timeout: Option<Duration>) -> ProxyResult<TcpStream> {
    let connect = TcpStream::connect(destination);
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, connect).await.unwrap_or_else(|_| {
            Err(io::Error::new(io::ErrorKind::TimedOut, "connect deadline elapsed"))
        }),
        None => connect.await,
    };

    result.map_err(|source| ProxyError::Dial {
        destination: destination.to_string(),
        source,
    })
}

/// Session task body spawned by the listener.
pub async fn serve(stream: TcpStream, peer_addr: SocketAddr, config: Arc<ProxyConfig>) {
    match handle_connection(stream, &config).await {
        Ok(summary) => {
            metrics::record_session("ok");
            tracing::debug!(
                id = %summary.id,
                peer_addr = %peer_addr,
                request_bytes = summary.upstream.bytes,
                response_bytes = summary.downstream.bytes,
                "Session complete"
            );
        }
        Err(e) => {
            metrics::record_session(e.kind());
            report(&e, peer_addr);
        }
    }
}

fn report(error: &ProxyError, peer_addr: SocketAddr) {
    match error {
        e if e.is_silent() => {
            tracing::debug!(peer_addr = %peer_addr, error = %e, "Dropped unparseable request")
        }
        ProxyError::LogCreate { .. } => {
            tracing::error!(peer_addr = %peer_addr, error = %error, "Session aborted")
        }
        _ => tracing::warn!(
            peer_addr = %peer_addr,
            kind = error.kind(),
            error = %error,
            "Session aborted"
        ),
    }
}
