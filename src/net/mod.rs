//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop with accept deadline)
//!     → connection.rs (correlation id, session tracking)
//!     → deadline.rs (Conn: every read/write bounded by a deadline)
//!     → Hand off to the connection handler
//! ```
//!
//! # Design Decisions
//! - Deadlines are a capability of network endpoints only
//! - One task per connection; sessions share nothing but the listener

pub mod connection;
pub mod deadline;
pub mod listener;

pub use connection::CorrelationId;
pub use deadline::{arm_deadline, Conn, Endpoint, Sink, Source, SupportsDeadline};
pub use listener::Listener;
