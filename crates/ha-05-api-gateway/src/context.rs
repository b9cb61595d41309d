//! Shared state handed to every handler.

use ha_01_epoch_store::EpochSeedStore;
use ha_02_contagion_filter::FilterMetrics;
use ha_03_ingestion::{IngestMetrics, IngestionApi, IngestionService};
use ha_04_distribution::DistributionService;
use std::sync::Arc;
use tokio::sync::watch;

use crate::adapters::JsonCodec;
use crate::metrics::GatewayMetrics;
use crate::ports::ExchangeCodec;

/// Everything the HTTP surface talks to, built once at startup.
pub struct ServerContext {
    pub ingestion: Arc<dyn IngestionApi>,
    pub distribution: Arc<DistributionService>,
    pub store: Arc<EpochSeedStore>,
    pub codec: Arc<dyn ExchangeCodec>,
    pub ingest_metrics: Arc<IngestMetrics>,
    pub filter_metrics: Arc<FilterMetrics>,
    pub metrics: GatewayMetrics,
    /// Set to `true` to stop the server.
    pub shutdown: watch::Sender<bool>,
    pub debug: bool,
}

impl ServerContext {
    /// Context using the JSON codec; also returns the shutdown receiver.
    pub fn new(
        store: Arc<EpochSeedStore>,
        ingestion: Arc<IngestionService>,
        distribution: Arc<DistributionService>,
        filter_metrics: Arc<FilterMetrics>,
        debug: bool,
    ) -> (Self, watch::Receiver<bool>) {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let ingest_metrics = Arc::clone(ingestion.metrics());
        let context = Self {
            ingestion,
            distribution,
            store,
            codec: Arc::new(JsonCodec),
            ingest_metrics,
            filter_metrics,
            metrics: GatewayMetrics::new(),
            shutdown,
            debug,
        };
        (context, shutdown_rx)
    }

    pub fn with_codec(mut self, codec: Arc<dyn ExchangeCodec>) -> Self {
        self.codec = codec;
        self
    }
}
