//! # Health Authority Runtime Library
//!
//! Configuration, CLI and subsystem wiring of the `ha-server` binary,
//! exposed for tests.

pub mod cli;
pub mod container;

pub use cli::{Cli, Command};
pub use container::{ConfigError, HealthAuthority, ServerConfig, StartupError};
