//! Ports Layer

pub mod inbound;
pub mod outbound;

pub use inbound::IngestionApi;
pub use outbound::{AuthGrant, Authorizer, RebuildTrigger};
