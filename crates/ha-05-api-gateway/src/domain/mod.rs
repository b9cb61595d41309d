//! Gateway domain types

pub mod config;
pub mod error;

pub use config::{GatewayConfig, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT};
pub use error::ApiError;
