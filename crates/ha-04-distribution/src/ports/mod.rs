//! Ports Layer

pub mod inbound;
pub mod outbound;

pub use inbound::DistributionApi;
pub use outbound::ArtifactSource;
