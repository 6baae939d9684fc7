//! Request line sniffing and destination resolution.
//!
//! # Responsibilities
//! - Collect at most `SNIFF_LIMIT` bytes from the head of a client stream
//! - Match `METHOD target HTTP` and parse the target as an absolute URI
//! - Resolve the origin `host:port`, defaulting to port 80
//!
//! # Design Decisions
//! - Only the collected prefix is ever inspected; a longer request line fails
//! - The prefix is handed back to the caller untouched so it can be replayed

use std::fmt;

use http::Uri;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::error::{is_timeout, ProxyError, ProxyResult};
use crate::net::deadline::Source;

/// Upper bound on the bytes inspected to find the request line.
pub const SNIFF_LIMIT: usize = 1024;

/// Port used when the request target names none.
pub const DEFAULT_PORT: u16 = 80;

static QUERY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)^([A-Z]+) (.*?) HTTP").expect("query pattern compiles"));

static PORT_PATTERN: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r":[0-9]{1,5}$").expect("port pattern compiles"));

/// What the sniffer learned from the request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SniffedRequest {
    pub method: String,
    pub uri: Uri,
    /// `host:port` of the origin to dial.
    pub destination: String,
}

impl fmt::Display for SniffedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri)
    }
}

/// Read the head of `stream` until a request line is visible.
///
/// Stops when the pattern matches, `SNIFF_LIMIT` bytes are held, the stream
/// ends, or a read fails (an elapsed deadline included). Whatever was read is
/// returned; the caller decides whether it is a request.
pub async fn collect<S: Source + ?Sized>(stream: &mut S) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(SNIFF_LIMIT);
    let mut chunk = [0u8; SNIFF_LIMIT];

    while prefix.len() < SNIFF_LIMIT && !QUERY_PATTERN.is_match(&prefix) {
        let room = SNIFF_LIMIT - prefix.len();
        match stream.recv(&mut chunk[..room]).await {
            Ok(0) => break,
            Ok(n) => prefix.extend_from_slice(&chunk[..n]),
            Err(e) if is_timeout(&e) => break,
            Err(e) => {
                tracing::debug!(error = %e, collected = prefix.len(), "Read failed while sniffing");
                break;
            }
        }
    }

    prefix
}

/// Extract the request line from `prefix` and resolve its destination.
pub fn inspect(prefix: &[u8]) -> ProxyResult<SniffedRequest> {
    let window = &prefix[..prefix.len().min(SNIFF_LIMIT)];
    let captures = QUERY_PATTERN
        .captures(window)
        .ok_or(ProxyError::MalformedRequest)?;

    let method = String::from_utf8_lossy(&captures[1]).into_owned();
    let raw_target = &captures[2];

    let target = std::str::from_utf8(raw_target).map_err(|_| ProxyError::UriParse {
        target: String::from_utf8_lossy(raw_target).into_owned(),
        reason: "target is not valid UTF-8".to_string(),
    })?;
    let invalid = |reason: &str| ProxyError::UriParse {
        target: target.to_string(),
        reason: reason.to_string(),
    };

    let uri: Uri = target.parse().map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;
    if uri.scheme().is_none() {
        return Err(invalid("target is not an absolute URI"));
    }
    let authority = uri.authority().ok_or_else(|| invalid("missing host"))?;

    // Userinfo never takes part in the destination.
    let host = authority.as_str().rsplit('@').next().unwrap_or_default();
    if host.is_empty() || host.starts_with(':') {
        return Err(invalid("missing host"));
    }

    let destination = resolve_destination(host);
    Ok(SniffedRequest {
        method,
        uri,
        destination,
    })
}

/// `host` verbatim when it carries a port, otherwise `host:80`.
pub fn resolve_destination(host: &str) -> String {
    if PORT_PATTERN.is_match(host) {
        host.to_string()
    } else {
        format!("{}:{}", host, DEFAULT_PORT)
    }
}
