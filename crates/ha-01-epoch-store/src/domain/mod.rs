//! Domain Layer - Pure store logic
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod errors;
pub mod keys;
pub mod snapshot;
