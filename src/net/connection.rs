//! Session identity and lifetime tracking.
//!
//! # Responsibilities
//! - Issue correlation identifiers used to name capture files
//! - Track how many sessions are in flight
//!
//! # Design Decisions
//! - Identifiers are nanosecond wall-clock timestamps, bumped forward when two
//!   sessions would otherwise land on the same tick, so names stay ordered and
//!   never collide inside one process

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::observability::metrics;

/// Last identifier handed out by this process.
static LAST_ISSUED: AtomicU64 = AtomicU64::new(0);

/// Correlates the request and response capture files of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationId(u64);

impl CorrelationId {
    /// Issue an identifier for the current instant.
    pub fn new() -> Self {
        Self::at(unix_nanos())
    }

    /// Issue an identifier for `nanos`, moved past any identifier already issued.
    pub fn at(nanos: u64) -> Self {
        let previous = LAST_ISSUED
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
                Some(nanos.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        Self(nanos.max(previous.saturating_add(1)))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn unix_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

/// Counts sessions that are still being handled.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    active: Arc<AtomicU64>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new session. The returned guard ends it on drop.
    pub fn track(&self) -> SessionGuard {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_sessions(active);
        SessionGuard {
            active: Arc::clone(&self.active),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Held by a session task for as long as it runs.
#[derive(Debug)]
pub struct SessionGuard {
    active: Arc<AtomicU64>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let active = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_active_sessions(active);
    }
}
