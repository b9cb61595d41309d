//! Ports Layer
//!
//! - Driving Ports (inbound): how other subsystems ask for a rebuild
//! - Driven Ports (outbound): the snapshot source and the swappable builder

pub mod inbound;
pub mod outbound;

pub use inbound::RebuildTrigger;
pub use outbound::{MembershipBuilder, SnapshotSource};
