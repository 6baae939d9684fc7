//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Direction;
use crate::relay::RelayOptions;

/// Root configuration for the capture proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, accept deadline).
    pub listener: ListenerConfig,

    /// Per-phase deadlines.
    pub timeouts: TimeoutConfig,

    /// Relay loop tuning.
    pub relay: RelayConfig,

    /// Where request/response captures are written.
    pub capture: CaptureConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:1500").
    pub bind_address: String,

    /// How long a single accept waits before the loop goes round again.
    pub accept_timeout_ms: u64,
}

impl ListenerConfig {
    pub fn accept_timeout(&self) -> Duration {
        Duration::from_millis(self.accept_timeout_ms)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:1500".to_string(),
            accept_timeout_ms: 1000,
        }
    }
}

/// Deadlines, in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Client read deadline while the request line is sniffed.
    pub sniff_ms: u64,

    /// Per-operation deadline of the client → origin relay.
    pub request_ms: u64,

    /// Per-operation deadline of the origin → client relay.
    pub response_ms: u64,

    /// Per-write deadline the tee applies to its sinks.
    pub tee_ms: u64,

    /// Dial deadline; 0 waits for the operating system.
    pub connect_ms: u64,
}

impl TimeoutConfig {
    pub fn sniff(&self) -> Duration {
        Duration::from_millis(self.sniff_ms)
    }

    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    pub fn response(&self) -> Duration {
        Duration::from_millis(self.response_ms)
    }

    pub fn tee(&self) -> Duration {
        Duration::from_millis(self.tee_ms)
    }

    pub fn connect(&self) -> Option<Duration> {
        (self.connect_ms > 0).then(|| Duration::from_millis(self.connect_ms))
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            sniff_ms: 100,
            request_ms: 100,
            response_ms: 2000,
            tee_ms: 1000,
            connect_ms: 0,
        }
    }
}

/// How many consecutive read timeouts a relay direction tolerates.
///
/// In TOML: `"unlimited"`, or `{ limit = N }` where the (N + 1)th consecutive
/// timeout ends the relay.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IdleRounds {
    Unlimited,
    Limit(u32),
}

impl IdleRounds {
    /// Ends the relay at the first read timeout.
    pub const FIRST_TIMEOUT: Self = IdleRounds::Limit(0);

    pub fn as_option(self) -> Option<u32> {
        match self {
            IdleRounds::Unlimited => None,
            IdleRounds::Limit(rounds) => Some(rounds),
        }
    }
}

/// Relay loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// Size of the intermediate copy buffer.
    pub buffer_size: usize,

    /// Idle tolerance of the client → origin relay. Clients that keep the
    /// connection open after their request rely on this ending the relay.
    pub request_idle_rounds: IdleRounds,

    /// Idle tolerance of the origin → client relay.
    pub response_idle_rounds: IdleRounds,
}

impl RelayConfig {
    /// Options for one relay direction with the given per-operation deadline.
    pub fn options(&self, direction: Direction, timeouts: &TimeoutConfig) -> RelayOptions {
        let (timeout, idle) = match direction {
            Direction::Request => (timeouts.request(), self.request_idle_rounds),
            Direction::Response => (timeouts.response(), self.response_idle_rounds),
        };
        RelayOptions::new(timeout)
            .buffer_size(self.buffer_size)
            .max_idle_rounds(idle.as_option())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            buffer_size: crate::relay::pipe::BUFFER_SIZE,
            request_idle_rounds: IdleRounds::FIRST_TIMEOUT,
            response_idle_rounds: IdleRounds::FIRST_TIMEOUT,
        }
    }
}

/// Capture file configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Directory receiving `<id>_req` / `<id>_res` files.
    pub directory: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
