//! # Ports
//!
//! - `inbound`: what readers of the store depend on
//! - `outbound`: what the store requires from its backend

pub mod inbound;
pub mod outbound;
