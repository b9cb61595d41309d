//! Wired health authority pipelines for the scenarios.

use axum::Router;
use chrono::Duration;
use ha_01_epoch_store::test_utils::{FaultInjector, FaultyKVStore};
use ha_01_epoch_store::EpochSeedStore;
use ha_02_contagion_filter::{
    builder_for, ArtifactPublisher, FilterBuilder, FilterConfig, FilterMetrics, RebuildBackoff,
    RebuildScheduler, RebuildTrigger,
};
use ha_03_ingestion::{Authorizer, HmacTokenAuthorizer, IngestionConfig, IngestionService};
use ha_04_distribution::DistributionService;
use ha_05_api_gateway::{build_router, GatewayConfig, ServerContext};
use rand::Rng;
use shared_types::{Credential, DisclosureRecord, Epoch, ReportBatch, Seed, SEED_LENGTH};
use std::sync::Arc;
use tokio::sync::watch;

pub use ha_01_epoch_store::test_utils::make_test_record as record;

pub const TEST_SECRET: &[u8] = b"integration-test-secret";

/// Every subsystem except the HTTP listener, over a fault-injectable store.
pub struct Pipeline {
    pub store: Arc<EpochSeedStore>,
    pub faults: FaultInjector,
    pub filter_metrics: Arc<FilterMetrics>,
    pub publisher: Arc<ArtifactPublisher>,
    pub builder: Arc<FilterBuilder>,
    /// Present when rebuilds run on the background worker.
    pub scheduler: Option<Arc<RebuildScheduler>>,
    pub authorizer: Arc<HmacTokenAuthorizer>,
    pub ingestion: Arc<IngestionService>,
    pub distribution: Arc<DistributionService>,
}

impl Pipeline {
    /// Rebuilds run synchronously inside each commit.
    pub fn inline(config: FilterConfig) -> Self {
        Self::wire(config, false)
    }

    /// Rebuilds run on a `RebuildScheduler`; needs a tokio runtime.
    pub fn scheduled(config: FilterConfig) -> Self {
        Self::wire(config.with_retry(RebuildBackoff::fast()), true)
    }

    fn wire(config: FilterConfig, scheduled: bool) -> Self {
        let backend = FaultyKVStore::new();
        let faults = backend.injector();
        let store = Arc::new(EpochSeedStore::open(backend).expect("empty store opens"));

        let filter_metrics = Arc::new(FilterMetrics::new());
        let publisher = Arc::new(ArtifactPublisher::new(Arc::clone(&filter_metrics)));
        let builder = Arc::new(FilterBuilder::new(
            Arc::clone(&store) as _,
            builder_for(&config),
            Arc::clone(&publisher),
        ));

        let scheduler = scheduled.then(|| {
            Arc::new(RebuildScheduler::spawn(
                Arc::clone(&builder),
                config.retry.clone(),
            ))
        });
        let trigger: Arc<dyn RebuildTrigger> = match &scheduler {
            Some(scheduler) => Arc::clone(scheduler) as _,
            None => Arc::clone(&builder) as _,
        };

        let authorizer = Arc::new(HmacTokenAuthorizer::new(TEST_SECRET));
        let ingestion = Arc::new(IngestionService::new(
            Arc::clone(&store),
            Arc::clone(&authorizer) as Arc<dyn Authorizer>,
            trigger,
            IngestionConfig::default(),
        ));
        let distribution = Arc::new(DistributionService::new(Arc::clone(&publisher) as _));

        Self {
            store,
            faults,
            filter_metrics,
            publisher,
            builder,
            scheduler,
            authorizer,
            ingestion,
            distribution,
        }
    }

    pub fn token(&self) -> Credential {
        Credential::new(self.authorizer.issue(Duration::hours(1)))
    }

    /// Batch of `records` carrying a fresh token.
    pub fn batch(&self, records: Vec<DisclosureRecord>) -> ReportBatch {
        ReportBatch::new(self.token(), records)
    }

    /// HTTP router over this pipeline and its shutdown receiver.
    pub fn router(&self, debug: bool) -> (Router, watch::Receiver<bool>) {
        let (context, shutdown_rx) = ServerContext::new(
            Arc::clone(&self.store),
            Arc::clone(&self.ingestion),
            Arc::clone(&self.distribution),
            Arc::clone(&self.filter_metrics),
            debug,
        );
        let config = GatewayConfig {
            debug,
            ..Default::default()
        };
        (build_router(Arc::new(context), &config), shutdown_rx)
    }

    /// Wait until the served filter covers `generation`.
    pub async fn settle(&self, generation: u64) {
        if let Some(scheduler) = &self.scheduler {
            scheduler.wait_for_generation(generation).await;
        }
    }
}

/// `count` records with random seeds in epochs `[base, base + count)`.
pub fn random_records(rng: &mut impl Rng, base: u32, count: usize) -> Vec<DisclosureRecord> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; SEED_LENGTH];
            rng.fill(&mut seed);
            DisclosureRecord::new(Epoch(base + i as u32), Seed::new(seed))
        })
        .collect()
}
