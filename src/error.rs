//! Session error taxonomy.
//!
//! # Responsibilities
//! - Name every way a session (or the listener) can fail
//! - Separate silent aborts from failures an operator should see
//!
//! # Design Decisions
//! - Timeouts are not errors here: they travel as `io::ErrorKind::TimedOut`
//!   and are absorbed by the relay loop and the tee
//! - Only `Bind` is fatal to the process; everything else is local to a session

use std::fmt;
use std::io;

/// Direction of a relay inside a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client to origin, duplicated into the request log.
    Request,
    /// Origin to client, duplicated into the response log.
    Response,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while accepting or handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    #[error("failed to parse HTTP query header")]
    MalformedRequest,

    #[error("invalid request target {target:?}: {reason}")]
    UriParse { target: String, reason: String },

    #[error("failed to connect to {destination}: {source}")]
    Dial {
        destination: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to create capture file {path}: {source}")]
    LogCreate {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{direction} relay failed: {source}")]
    Relay {
        direction: Direction,
        #[source]
        source: io::Error,
    },
}

impl ProxyError {
    /// Errors that drop the session without an operator-facing report.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            ProxyError::MalformedRequest | ProxyError::UriParse { .. }
        )
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Bind { .. } => "bind",
            ProxyError::Accept(_) => "accept",
            ProxyError::MalformedRequest => "malformed_request",
            ProxyError::UriParse { .. } => "uri_parse",
            ProxyError::Dial { .. } => "dial",
            ProxyError::LogCreate { .. } => "log_create",
            ProxyError::Relay { .. } => "relay",
        }
    }
}

pub type ProxyResult<T> = Result<T, ProxyError>;

/// Whether an I/O error is an elapsed deadline rather than a real failure.
pub fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}
