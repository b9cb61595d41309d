//! # HA-05 API Gateway
//!
//! HTTP surface of the health authority.
//!
//! ```text
//!   clients ── GET /filter, /version ──────> DistributionService (ha-04)
//!   reporters ── POST /add_contagious ──> ExchangeCodec ──> IngestionService (ha-03)
//!   operators ── GET /health, /shutdown
//! ```
//!
//! Handlers get everything through an explicit [`ServerContext`]; the wire
//! encoding of reports lives behind [`ExchangeCodec`].
//!
//! Middleware: request body limit (1 MiB by default) and request tracing,
//! both from `tower-http`.

#![deny(unsafe_code)]

pub mod adapters;
pub mod context;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod router;
pub mod service;

pub use adapters::JsonCodec;
pub use context::ServerContext;
pub use domain::{ApiError, GatewayConfig, DEFAULT_MAX_BODY_BYTES};
pub use metrics::{GatewayMetrics, GatewayMetricsSnapshot};
pub use ports::ExchangeCodec;
pub use router::{build_router, HealthReport, FILTER_VERSION_HEADER};
pub use service::{ApiGatewayService, GatewayError};
