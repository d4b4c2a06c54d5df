//! Service layer for the Radarr application
//!
//! Wires the scheduler's registered tasks (rss-sync, autosearch) and the
//! queue broadcaster's adaptive loop against a shared database pool,
//! indexer client, download client and event bus.

use std::sync::Arc;
use radarr_core::{RadarrError, Result};
use radarr_core::events::EventBus;
use radarr_import::{EventBusImportTrigger, ImportTrigger};
use radarr_indexers::IndexerClient;
use radarr_downloaders::{DownloaderService, QBittorrentClient, QueueBroadcaster};
use radarr_infrastructure::{DatabasePool, PostgresAcquisitionRepository};
use radarr_scheduler::TaskRegistry;
use tokio::sync::oneshot;
use tracing::{info, debug, warn, instrument};

pub mod simplified_media_service;
pub mod rss_service;
pub mod autosearch_service;

pub use simplified_media_service::*;
pub use rss_service::*;
pub use autosearch_service::*;

pub type AppQueueBroadcaster = QueueBroadcaster<PostgresAcquisitionRepository>;

/// Application services container
#[derive(Clone)]
pub struct AppServices {
    /// Media service for startup connectivity checks
    pub media_service: Arc<SimplifiedMediaService>,
    /// Database pool
    pub database_pool: DatabasePool,
    /// Indexer client for direct API access
    pub indexer_client: Arc<dyn IndexerClient + Send + Sync>,
    /// Event bus for inter-component communication
    pub event_bus: Arc<EventBus>,
    /// Cron task registry (§4.9) — owns the RSS sync and autosearch
    /// cycles.
    pub scheduler: Arc<TaskRegistry>,
    /// RSS sync orchestrator, registered with `scheduler` once started.
    pub rss_sync: Option<Arc<AppRssOrchestrator>>,
    /// Queue broadcaster (§4.7/§4.8), driven by its own adaptive loop
    /// rather than a cron tick; spawned alongside the scheduler.
    pub queue_broadcaster: Option<Arc<AppQueueBroadcaster>>,
}

impl AppServices {
    /// Create new application services with all dependencies
    pub async fn new(
        database_pool: DatabasePool,
        prowlarr_client: Arc<dyn IndexerClient + Send + Sync>,
        qbittorrent_client: Arc<QBittorrentClient>,
    ) -> Result<Self> {
        let event_bus = Arc::new(EventBus::new());

        let media_service = Arc::new(SimplifiedMediaService::new(
            database_pool.clone(),
            prowlarr_client.clone(),
            qbittorrent_client,
        ));

        let scheduler = Arc::new(TaskRegistry::new().await?);

        Ok(Self {
            media_service,
            database_pool,
            indexer_client: prowlarr_client,
            event_bus,
            scheduler,
            rss_sync: None,
            queue_broadcaster: None,
        })
    }

    /// Build the RSS sync orchestrator and register its cycle on
    /// `scheduler`.
    pub async fn initialize_rss_service(&mut self) -> Result<()> {
        let orchestrator = register_rss_sync(
            &self.scheduler,
            self.database_pool.clone(),
            self.indexer_client.clone(),
            self.event_bus.clone(),
        )
        .await?;

        self.rss_sync = Some(orchestrator);
        Ok(())
    }

    /// Register the autosearch cycle on `scheduler`.
    pub async fn initialize_autosearch(&self) -> Result<()> {
        register_autosearch(
            &self.scheduler,
            self.database_pool.clone(),
            self.indexer_client.clone(),
            self.event_bus.clone(),
        )
        .await
    }

    /// Build the queue broadcaster. Returns the shutdown sender so the
    /// caller can stop its adaptive loop on graceful shutdown.
    pub fn initialize_queue_broadcaster(&mut self) -> oneshot::Sender<()> {
        let repo = Arc::new(PostgresAcquisitionRepository::new(self.database_pool.clone()));
        let service = Arc::new(DownloaderService::new(repo));
        let import_trigger: Arc<dyn ImportTrigger> = Arc::new(EventBusImportTrigger::new(self.event_bus.clone()));
        let broadcaster = Arc::new(QueueBroadcaster::new(service, self.event_bus.clone(), import_trigger));

        self.queue_broadcaster = Some(broadcaster.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            if let Err(e) = broadcaster.run(shutdown_rx).await {
                warn!("queue broadcaster failed: {}", e);
            }
        });
        shutdown_tx
    }

    /// Start the cron scheduler, which starts ticking rss-sync and
    /// autosearch in the background.
    pub async fn start_scheduler(&self) -> Result<()> {
        self.scheduler.start().await?;
        info!("scheduler started");
        Ok(())
    }

    /// Initialize all services and test connectivity
    pub async fn initialize(&self) -> Result<()> {
        info!("Initializing application services");

        self.test_database().await?;
        self.media_service.initialize().await?;

        info!("All services initialized successfully");
        Ok(())
    }

    /// Test database connectivity
    pub async fn test_database(&self) -> Result<()> {
        debug!("Testing database connectivity");

        sqlx::query("SELECT 1")
            .fetch_one(&self.database_pool)
            .await
            .map_err(|e| RadarrError::ExternalServiceError {
                service: "database_connectivity_test".to_string(),
                error: e.to_string(),
            })?;

        info!("Database connectivity verified");
        Ok(())
    }
}

/// Service initialization helper
pub struct ServiceBuilder {
    database_pool: Option<DatabasePool>,
    prowlarr_client: Option<Arc<dyn IndexerClient + Send + Sync>>,
    qbittorrent_client: Option<Arc<QBittorrentClient>>,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self {
            database_pool: None,
            prowlarr_client: None,
            qbittorrent_client: None,
        }
    }

    pub fn with_database(mut self, pool: DatabasePool) -> Self {
        self.database_pool = Some(pool);
        self
    }

    pub fn with_prowlarr(mut self, client: Arc<dyn IndexerClient + Send + Sync>) -> Self {
        self.prowlarr_client = Some(client);
        self
    }

    pub fn with_qbittorrent(mut self, client: Arc<QBittorrentClient>) -> Self {
        self.qbittorrent_client = Some(client);
        self
    }

    pub async fn build(self) -> Result<AppServices> {
        let database_pool = self.database_pool.ok_or_else(|| RadarrError::ValidationError {
            field: "database_pool".to_string(),
            message: "Database pool is required".to_string(),
        })?;

        let prowlarr_client = self.prowlarr_client.ok_or_else(|| RadarrError::ValidationError {
            field: "prowlarr_client".to_string(),
            message: "Prowlarr client is required".to_string(),
        })?;

        let qbittorrent_client = self.qbittorrent_client.ok_or_else(|| RadarrError::ValidationError {
            field: "qbittorrent_client".to_string(),
            message: "qBittorrent client is required".to_string(),
        })?;

        AppServices::new(database_pool, prowlarr_client, qbittorrent_client).await
    }
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[tokio::test]
    async fn test_service_builder() {
        let db_config = radarr_infrastructure::DatabaseConfig {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..radarr_infrastructure::DatabaseConfig::default()
        };
        let pool = radarr_infrastructure::create_pool(db_config).await.unwrap();
        let prowlarr_config = radarr_indexers::ProwlarrConfig::default();
        let prowlarr_client = Arc::new(radarr_indexers::ProwlarrClient::new(prowlarr_config).unwrap());
        let qbittorrent_config = radarr_downloaders::QBittorrentConfig::default();
        let qbittorrent_client = Arc::new(QBittorrentClient::new(qbittorrent_config).unwrap());

        let services = ServiceBuilder::new()
            .with_database(pool)
            .with_prowlarr(prowlarr_client)
            .with_qbittorrent(qbittorrent_client)
            .build()
            .await;

        assert!(services.is_ok());
    }

    #[test]
    fn test_incomplete_service_builder() {
        let builder = ServiceBuilder::new();

        tokio::runtime::Runtime::new().unwrap().block_on(async {
            let result = builder.build().await;
            assert!(result.is_err());
        });
    }
}
