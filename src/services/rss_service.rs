//! RSS sync service: wires `radarr_sync::RssSyncOrchestrator` up to the
//! application's database pool, indexer client and event bus, and
//! registers its cycle as a scheduled task (§4.5, §4.9).
//!
//! Replaces the teacher's movie-only, single-indexer `RssService` /
//! `RssMonitor` loop: season packs, multi-indexer backoff and the
//! grab-lock/history dedup pipeline now live in `radarr_sync` itself,
//! so this module is reduced to construction plus scheduling.

use std::sync::Arc;

use radarr_core::{events::EventBus, Result};
use radarr_downloaders::DownloaderService;
use radarr_indexers::IndexerClient;
use radarr_infrastructure::{DatabasePool, PostgresAcquisitionRepository, PostgresQualityProfileStore};
use radarr_scheduler::TaskRegistry;
use radarr_sync::{ClientFeedSource, GrabLock, QualityProfileStore, RssFetcher, RssSyncOrchestrator};
use tracing::info;

/// Cron schedule for the periodic RSS sync cycle (§4.5's "runs on a
/// fixed interval"); every 5 minutes mirrors the teacher's
/// `RssServiceConfig::check_interval_seconds` default of 300s.
pub const RSS_SYNC_CRON: &str = "0 */5 * * * *";

pub type AppRssOrchestrator = RssSyncOrchestrator<PostgresAcquisitionRepository, ClientFeedSource>;

/// Builds the orchestrator and registers its cycle with the scheduler.
/// Returns the orchestrator itself so callers (e.g. a manual "sync now"
/// API handler) can invoke `run_cycle` directly as well.
pub async fn register_rss_sync(
    scheduler: &TaskRegistry,
    database_pool: DatabasePool,
    indexer_client: Arc<dyn IndexerClient + Send + Sync>,
    event_bus: Arc<EventBus>,
) -> Result<Arc<AppRssOrchestrator>> {
    let repo = Arc::new(PostgresAcquisitionRepository::new(database_pool.clone()));
    let profiles: Arc<dyn QualityProfileStore> = Arc::new(PostgresQualityProfileStore::new(database_pool));
    let service = Arc::new(DownloaderService::new(repo.clone()));
    let grab_lock = Arc::new(GrabLock::new());
    let fetcher = Arc::new(RssFetcher::new(ClientFeedSource::new(indexer_client)));

    let orchestrator = Arc::new(RssSyncOrchestrator::new(repo, service, profiles, event_bus, grab_lock, fetcher));

    let task_orchestrator = orchestrator.clone();
    scheduler
        .register_task(
            "rss-sync",
            RSS_SYNC_CRON,
            true,
            Arc::new(move || {
                let orchestrator = task_orchestrator.clone();
                Box::pin(async move {
                    orchestrator.run_cycle().await?;
                    Ok(())
                })
            }),
        )
        .await?;

    info!("RSS sync registered with scheduler");
    Ok(orchestrator)
}
