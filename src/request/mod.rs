//! Request inspection subsystem.
//!
//! # Data Flow
//! ```text
//! client stream (read deadline armed)
//!     → sniffer.rs (collect ≤ 1024 bytes, match request line, resolve host:port)
//!     → rewind.rs (collected bytes replayed ahead of the live stream)
//!     → relay
//! ```

pub mod rewind;
pub mod sniffer;

pub use rewind::Rewind;
pub use sniffer::{SniffedRequest, SNIFF_LIMIT};
