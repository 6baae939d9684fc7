//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc with every session
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults; an empty file gives port 1500 with 100ms / 2000ms relays
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, read_config, ConfigError};
pub use schema::{
    CaptureConfig, IdleRounds, ListenerConfig, ObservabilityConfig, ProxyConfig, RelayConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
