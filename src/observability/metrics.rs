//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (connections, sessions, relayed bytes, timeouts)
//! - Expose a Prometheus-compatible endpoint when enabled
//!
//! # Metrics
//! - `proxy_connections_accepted_total` (counter)
//! - `proxy_active_sessions` (gauge): sessions still being handled
//! - `proxy_sessions_total` (counter): finished sessions by outcome
//! - `proxy_bytes_relayed_total` (counter): bytes by direction
//! - `proxy_relay_timeouts_total` (counter): absorbed timeouts by direction and op
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op, so tests and the
//!   default configuration pay nothing

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::Direction;
use crate::relay::RelayStats;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint enabled"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_accept() {
    counter!("proxy_connections_accepted_total").increment(1);
}

pub fn set_active_sessions(active: u64) {
    gauge!("proxy_active_sessions").set(active as f64);
}

/// Count a finished session; `outcome` is "ok" or an error kind.
pub fn record_session(outcome: &'static str) {
    counter!("proxy_sessions_total", "outcome" => outcome).increment(1);
}

pub fn record_relay(direction: Direction, stats: &RelayStats) {
    let direction = direction.as_str();
    counter!("proxy_bytes_relayed_total", "direction" => direction).increment(stats.bytes);
    if stats.read_timeouts > 0 {
        counter!("proxy_relay_timeouts_total", "direction" => direction, "op" => "read")
            .increment(stats.read_timeouts);
    }
    if stats.write_timeouts > 0 {
        counter!("proxy_relay_timeouts_total", "direction" => direction, "op" => "write")
            .increment(stats.write_timeouts);
    }
}
