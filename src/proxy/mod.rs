//! Proxy session subsystem.
//!
//! # Data Flow
//! ```text
//! accepted stream
//!     → handler.rs (sniff, dial, orchestrate)
//!     → capture.rs (<id>_req / <id>_res files)
//!     → relay (request then response, each teed into its capture)
//! ```

pub mod capture;
pub mod handler;

pub use capture::Capture;
pub use handler::{handle_connection, serve, SessionSummary};
