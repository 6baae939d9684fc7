//! Capture Proxy Library
//!
//! A transparent forwarding HTTP proxy that keeps a byte-exact copy of every
//! request it forwards and every response it returns.

// Core subsystems
pub mod config;
pub mod net;
pub mod proxy;
pub mod relay;
pub mod request;

// Cross-cutting concerns
pub mod error;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, ProxyResult};
pub use net::Listener;
pub use proxy::handle_connection;
