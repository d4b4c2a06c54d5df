//! Scheduled autosearch (§4.1, §4.6): the non-RSS driver path that
//! iterates wanted items and searches indexers directly instead of
//! scanning a feed, reusing the same collector/scorer/selector/grab
//! primitives as RSS sync.
//!
//! Mirrors `rss_service.rs`'s construction-plus-scheduling shape; the
//! cycle itself lives in `radarr_sync::{collect_targeted_matches,
//! score_and_grab}`.

use std::sync::Arc;

use radarr_core::{events::EventBus, Result};
use radarr_downloaders::DownloaderService;
use radarr_indexers::IndexerClient;
use radarr_infrastructure::{DatabasePool, PostgresAcquisitionRepository, PostgresQualityProfileStore};
use radarr_scheduler::TaskRegistry;
use radarr_sync::{collect_targeted_matches, score_and_grab, GrabLock, QualityProfileStore, RecentGrabBackoff};
use tracing::info;

/// Cron schedule for the periodic autosearch cycle; less frequent than
/// `rss_service::RSS_SYNC_CRON` since every wanted item gets its own
/// synchronous indexer search rather than one shared feed scan.
pub const AUTOSEARCH_CRON: &str = "0 0 * * * *";

/// Builds the autosearch cycle and registers it with the scheduler.
pub async fn register_autosearch(
    scheduler: &TaskRegistry,
    database_pool: DatabasePool,
    indexer_client: Arc<dyn IndexerClient + Send + Sync>,
    event_bus: Arc<EventBus>,
) -> Result<()> {
    let repo = Arc::new(PostgresAcquisitionRepository::new(database_pool.clone()));
    let profiles: Arc<dyn QualityProfileStore> = Arc::new(PostgresQualityProfileStore::new(database_pool));
    let service = Arc::new(DownloaderService::new(repo.clone()));
    let grab_lock = Arc::new(GrabLock::new());
    let backoff = Arc::new(RecentGrabBackoff::new(repo.clone()));

    scheduler
        .register_task(
            "autosearch",
            AUTOSEARCH_CRON,
            false,
            Arc::new(move || {
                let repo = repo.clone();
                let service = service.clone();
                let profiles = profiles.clone();
                let event_bus = event_bus.clone();
                let grab_lock = grab_lock.clone();
                let backoff = backoff.clone();
                let indexer_client = indexer_client.clone();
                Box::pin(async move {
                    let matches = collect_targeted_matches(repo.as_ref(), backoff.as_ref(), indexer_client.as_ref()).await?;
                    let summary = score_and_grab(&repo, &service, profiles.as_ref(), &event_bus, &grab_lock, matches).await?;
                    info!(
                        grabbed = summary.grabbed,
                        skipped_recent = summary.skipped_recent,
                        skipped_locked = summary.skipped_locked,
                        skipped_no_match = summary.skipped_no_match,
                        "autosearch cycle completed"
                    );
                    Ok(())
                })
            }),
        )
        .await?;

    info!("autosearch registered with scheduler");
    Ok(())
}
