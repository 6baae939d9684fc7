//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! listener / sessions produce:
//!     → logging.rs (structured log events, stdout + stderr)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → terminal or log collector
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
