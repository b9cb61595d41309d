//! Cross-crate scenarios

pub mod client;
pub mod flows;
pub mod http;
