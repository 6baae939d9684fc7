//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! request:  client (Rewind<Conn>) → pipe.rs → tee.rs → origin + request log
//! response: origin (Conn)         → pipe.rs → tee.rs → client + response log
//! ```
//!
//! # Design Decisions
//! - The two directions run one after the other, never concurrently
//! - Timeouts are absorbed; only real I/O errors end a relay early

pub mod pipe;
pub mod tee;

#[cfg(test)]
pub(crate) mod mock;

pub use pipe::{relay, RelayOptions, RelayStats};
pub use tee::Tee;
