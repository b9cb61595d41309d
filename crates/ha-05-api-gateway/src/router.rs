//! HTTP routes.
//!
//! | Route | Method | Response |
//! |-------|--------|----------|
//! | `/version` | GET | `{"version":"1"}` |
//! | `/filter` | GET | filter bytes, `ETag`, `X-Filter-Version` |
//! | `/add_contagious` | POST | `OK` / 400 / 401 / 503 |
//! | `/health` | GET | JSON status and counters |
//! | `/shutdown` | GET | debug mode only, otherwise 405 |

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ha_02_contagion_filter::{ArtifactMeta, FilterMetricsSnapshot};
use ha_03_ingestion::IngestMetricsSnapshot;
use ha_04_distribution::{DistributionApi, DistributionMetricsSnapshot};
use serde::Serialize;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::context::ServerContext;
use crate::domain::{ApiError, GatewayConfig};
use crate::metrics::GatewayMetricsSnapshot;

/// Header carrying the published filter version.
pub const FILTER_VERSION_HEADER: &str = "x-filter-version";

pub const SHUTDOWN_BODY: &str = "Server shutting down...";

type AppState = Arc<ServerContext>;

pub fn build_router(context: Arc<ServerContext>, config: &GatewayConfig) -> Router {
    Router::new()
        .route("/version", get(version))
        .route("/filter", get(filter))
        .route("/add_contagious", post(add_contagious))
        .route("/health", get(health))
        .route("/shutdown", get(shutdown))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

async fn version(State(ctx): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "version": ctx.distribution.get_api_version() }))
}

fn etag_for(digest: &str) -> String {
    format!("\"{digest}\"")
}

fn matches_etag(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|candidate| candidate == etag || candidate == "*")
}

async fn filter(State(ctx): State<AppState>, headers: HeaderMap) -> Response {
    let meta = ctx.distribution.current_meta();
    let etag = etag_for(&meta.digest);
    if matches_etag(&headers, &etag) {
        ctx.metrics.record_filter_request(true);
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }

    let artifact = ctx.distribution.get_filter();
    ctx.metrics.record_filter_request(false);

    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::ETAG, etag_for(&artifact.digest)),
        ],
        artifact.bytes.clone(),
    )
        .into_response();
    response.headers_mut().insert(
        FILTER_VERSION_HEADER,
        HeaderValue::from(artifact.version),
    );
    response
}

async fn add_contagious(State(ctx): State<AppState>, body: Bytes) -> Response {
    let batch = match ctx.codec.parse_batch(&body) {
        Ok(batch) => batch,
        Err(e) => {
            ctx.metrics.record_report(false);
            debug!(error = %e, "[ha-05] Unparseable contagious report");
            return e.into_response();
        }
    };

    let ingestion = Arc::clone(&ctx.ingestion);
    let outcome = match tokio::task::spawn_blocking(move || ingestion.commit_batch(batch)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            ctx.metrics.record_report(false);
            error!(error = %e, "[ha-05] Ingestion worker failed");
            return ApiError::Internal(e.to_string()).into_response();
        }
    };

    ctx.metrics.record_report(outcome.is_ok());
    ctx.codec.write_response(outcome)
}

#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub generation: u64,
    pub records: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub api_version: &'static str,
    /// Whether the served filter covers every committed batch.
    pub filter_current: bool,
    pub store: StoreHealth,
    pub filter: ArtifactMeta,
    pub rebuilds: FilterMetricsSnapshot,
    pub ingestion: IngestMetricsSnapshot,
    pub distribution: DistributionMetricsSnapshot,
    pub gateway: GatewayMetricsSnapshot,
}

async fn health(State(ctx): State<AppState>) -> Json<HealthReport> {
    let filter = ctx.distribution.current_meta();
    let generation = ctx.store.generation();
    Json(HealthReport {
        status: "ok",
        api_version: ctx.distribution.get_api_version(),
        filter_current: filter.generation >= generation,
        store: StoreHealth {
            generation,
            records: ctx.store.len(),
        },
        filter,
        rebuilds: ctx.filter_metrics.snapshot(),
        ingestion: ctx.ingest_metrics.snapshot(),
        distribution: ctx.distribution.metrics(),
        gateway: ctx.metrics.snapshot(),
    })
}

async fn shutdown(State(ctx): State<AppState>) -> Response {
    if !ctx.debug {
        return ApiError::MethodNotAllowed.into_response();
    }
    info!("[ha-05] Shutdown requested over HTTP");
    ctx.shutdown.send_replace(true);
    (StatusCode::OK, SHUTDOWN_BODY).into_response()
}
