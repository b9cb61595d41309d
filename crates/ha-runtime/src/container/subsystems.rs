//! # Subsystem Container
//!
//! ## Initialization Order
//!
//! 1. Lock the database file (one server per database)
//! 2. Open the epoch seed store (ha-01)
//! 3. Load the last published filter, start the rebuild worker (ha-02)
//! 4. Token authorizer and ingestion service (ha-03)
//! 5. Distribution service (ha-04)
//! 6. Server context and HTTP gateway (ha-05)
//!
//! The rebuild worker is asked for the store's current generation right
//! away, so a database that outlived its filter file is covered again.

use ha_01_epoch_store::{
    DatabaseLock, EpochSeedStore, FileBackedKVStore, LockError, StoreError,
};
use ha_02_contagion_filter::{
    builder_for, ArtifactPublisher, FilterBuilder, FilterFile, FilterMetrics,
    RebuildScheduler,
};
use ha_03_ingestion::{Authorizer, HmacTokenAuthorizer, IngestionService};
use ha_04_distribution::DistributionService;
use ha_05_api_gateway::{ApiGatewayService, GatewayError, ServerContext};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use super::config::{ConfigError, ServerConfig};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("Failed to open the epoch seed store: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// All subsystems of one running health authority server.
pub struct HealthAuthority {
    pub store: Arc<EpochSeedStore>,
    pub scheduler: Arc<RebuildScheduler>,
    pub authorizer: Arc<HmacTokenAuthorizer>,
    pub ingestion: Arc<IngestionService>,
    pub distribution: Arc<DistributionService>,
    pub context: Arc<ServerContext>,
    gateway: ApiGatewayService,
    shutdown_rx: watch::Receiver<bool>,
    _lock: DatabaseLock,
}

impl HealthAuthority {
    /// Wire every subsystem. Must run inside a tokio runtime.
    pub fn build(config: &ServerConfig) -> Result<Self, StartupError> {
        config.validate_for_production()?;

        let lock = DatabaseLock::acquire(&config.storage.database)?;
        let backend = FileBackedKVStore::open(&config.storage.database).map_err(StoreError::from)?;
        let store = Arc::new(EpochSeedStore::open(backend)?);

        let filter_metrics = Arc::new(FilterMetrics::new());
        let publisher = Arc::new(ArtifactPublisher::with_file(
            FilterFile::new(&config.storage.filter),
            Arc::clone(&filter_metrics),
        ));
        let builder = Arc::new(FilterBuilder::new(
            Arc::clone(&store) as _,
            builder_for(&config.filter),
            Arc::clone(&publisher),
        ));
        let scheduler = Arc::new(RebuildScheduler::spawn(builder, config.filter.retry.clone()));
        scheduler.request(store.generation());

        let authorizer = Arc::new(HmacTokenAuthorizer::new(config.security.hmac_secret.to_vec()));
        let ingestion = Arc::new(IngestionService::new(
            Arc::clone(&store),
            Arc::clone(&authorizer) as Arc<dyn Authorizer>,
            Arc::clone(&scheduler) as _,
            config.ingestion.clone(),
        ));
        let distribution = Arc::new(DistributionService::new(publisher));

        let (context, shutdown_rx) = ServerContext::new(
            Arc::clone(&store),
            Arc::clone(&ingestion),
            Arc::clone(&distribution),
            filter_metrics,
            config.debug,
        );
        let context = Arc::new(context);
        let gateway = ApiGatewayService::new(config.gateway(), Arc::clone(&context))?;

        info!(
            database = %config.storage.database.display(),
            filter = %config.storage.filter.display(),
            records = store.len(),
            generation = store.generation(),
            kind = %config.filter.kind,
            "Health authority initialized"
        );

        Ok(Self {
            store,
            scheduler,
            authorizer,
            ingestion,
            distribution,
            context,
            gateway,
            shutdown_rx,
            _lock: lock,
        })
    }

    /// Handle for stopping the server from another task: set its
    /// `shutdown` to `true` and `run` returns once in-flight requests finish.
    pub fn shutdown_sender(&self) -> Arc<ServerContext> {
        Arc::clone(&self.context)
    }

    /// Serve until shutdown, then stop the rebuild worker.
    pub async fn run(self) -> Result<(), StartupError> {
        let Self {
            scheduler,
            gateway,
            shutdown_rx,
            _lock,
            ..
        } = self;

        gateway.serve(shutdown_rx).await?;
        scheduler.shutdown().await;
        info!("Health authority stopped");
        Ok(())
    }
}
