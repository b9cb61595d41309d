//! Runtime container: configuration and subsystem wiring.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, ServerConfig};
pub use subsystems::{HealthAuthority, StartupError};
