//! Score-and-grab (§4.6) plus the RSS sync cycle (§4.5) that ties the
//! wanted collector, matcher, scorer, selector and grab executor
//! together into one pass.
//!
//! Grounded in `core::services::rss_service.rs`'s single-flight
//! `AtomicBool`-guarded cycle, generalized from the teacher's
//! movie-only/single-indexer loop to the multi-indexer, season-aware
//! pipeline this spec calls for.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use radarr_core::domain::repositories::{
    DownloadClientRepository, GrabHistoryRepository, IndexerRssRepository, WantedRepository,
};
use radarr_core::events::{EventBus, SystemEvent};
use radarr_core::models::{CacheBoundary, ReleaseInfo, SearchableItem};
use radarr_core::{RadarrError, Result};
use radarr_decision::selector::select_best_release;
use radarr_downloaders::DownloaderService;
use tracing::{info, warn};

use crate::grab::{execute_grab, GrabRequest};
use crate::matcher::{match_release, MatchResult, WantedIndex};
use crate::profiles::QualityProfileStore;
use crate::rss_fetcher::{FeedSource, RssFetcher, MAX_RESULTS_PER_INDEXER};
use crate::scorer::{score_and_sort, DefaultScorer, ReleaseScorer, ScoreContext};
use crate::wanted::{collect_wanted, BackoffChecker};

/// Database-facing dependencies `score_and_grab`/`run_cycle` need,
/// bundled so callers don't have to restate five generic bounds.
pub trait SyncRepo:
    WantedRepository + DownloadClientRepository + IndexerRssRepository + GrabHistoryRepository + Send + Sync
{
}
impl<T> SyncRepo for T where
    T: WantedRepository + DownloadClientRepository + IndexerRssRepository + GrabHistoryRepository + Send + Sync
{
}

pub struct GrabSummary {
    pub grabbed: usize,
    pub skipped_recent: usize,
    pub skipped_locked: usize,
    pub skipped_no_match: usize,
}

/// §4.6: groups matches by `item_key()`, processes season groups first
/// (recording successes so sibling episode groups are suppressed), then
/// non-season groups.
pub async fn score_and_grab<R: SyncRepo + 'static>(
    repo: &Arc<R>,
    service: &DownloaderService<R>,
    profiles: &dyn QualityProfileStore,
    event_bus: &EventBus,
    grab_lock: &crate::grab_lock::GrabLock,
    matches: Vec<MatchResult>,
) -> Result<GrabSummary> {
    let scorer: &dyn ReleaseScorer = &DefaultScorer;
    let mut summary = GrabSummary { grabbed: 0, skipped_recent: 0, skipped_locked: 0, skipped_no_match: 0 };

    let mut groups: HashMap<String, (SearchableItem, Vec<ReleaseInfo>, bool)> = HashMap::new();
    for m in matches {
        let key = m.wanted_item.item_key();
        let entry = groups.entry(key).or_insert_with(|| (m.wanted_item.clone(), Vec::new(), m.is_season));
        entry.1.push(m.release);
    }

    let (season_groups, episode_groups): (Vec<_>, Vec<_>) =
        groups.into_iter().partition(|(_, (_, _, is_season))| *is_season);

    let mut grabbed_seasons: HashSet<(uuid::Uuid, i32)> = HashSet::new();

    for (_, (item, mut releases, _)) in season_groups {
        let outcome = process_group(repo, service, profiles, grab_lock, &item, &mut releases, scorer, true).await?;
        apply_outcome(event_bus, &mut summary, outcome);
        if let (Some(series_id), Some(season)) = (item.series_id, item.season_number) {
            grabbed_seasons.insert((series_id, season));
        }
    }

    for (_, (item, mut releases, _)) in episode_groups {
        if let (Some(series_id), Some(season)) = (item.series_id, item.season_number) {
            if grabbed_seasons.contains(&(series_id, season)) {
                continue;
            }
        }
        let outcome = process_group(repo, service, profiles, grab_lock, &item, &mut releases, scorer, false).await?;
        apply_outcome(event_bus, &mut summary, outcome);
    }

    Ok(summary)
}

enum GroupOutcome {
    Grabbed,
    SkippedRecent,
    SkippedLocked,
    SkippedNoMatch,
}

fn apply_outcome(_event_bus: &EventBus, summary: &mut GrabSummary, outcome: GroupOutcome) {
    match outcome {
        GroupOutcome::Grabbed => summary.grabbed += 1,
        GroupOutcome::SkippedRecent => summary.skipped_recent += 1,
        GroupOutcome::SkippedLocked => summary.skipped_locked += 1,
        GroupOutcome::SkippedNoMatch => summary.skipped_no_match += 1,
    }
}

#[allow(clippy::too_many_arguments)]
async fn process_group<R: SyncRepo + 'static>(
    repo: &Arc<R>,
    service: &DownloaderService<R>,
    profiles: &dyn QualityProfileStore,
    grab_lock: &crate::grab_lock::GrabLock,
    item: &SearchableItem,
    releases: &mut [ReleaseInfo],
    scorer: &dyn ReleaseScorer,
    is_season: bool,
) -> Result<GroupOutcome> {
    let recent = if is_season {
        if let (Some(series_id), Some(season)) = (item.series_id, item.season_number) {
            repo.has_recent_season_grab(series_id, season).await?
        } else {
            false
        }
    } else {
        repo.has_recent_grab(item.media_type, item.media_id).await?
    };
    if recent {
        return Ok(GroupOutcome::SkippedRecent);
    }

    let profile = profiles.get_profile(item.quality_profile_id).await?;
    let context = ScoreContext { year: item.year, season: item.season_number, episode: item.episode_number };
    score_and_sort(releases, &profile, &context, scorer);

    let Some(chosen) = select_best_release(releases, &profile, item) else {
        return Ok(GroupOutcome::SkippedNoMatch);
    };

    let Some(guard) = grab_lock.try_acquire(&item.grab_lock_key()) else {
        return Ok(GroupOutcome::SkippedLocked);
    };

    // targetSlotID is an opaque multi-version identifier (§GLOSSARY); we
    // only ever forward the one already carried on the wanted item.
    let target_slot_id = item.target_slot_id;

    let request = GrabRequest { release: &chosen, wanted_item: item, is_season_pack: is_season, target_slot_id };
    let result = execute_grab(service, repo.as_ref(), request).await;
    drop(guard);

    match result {
        Ok(outcome) => {
            let quality_name = profile.quality_name(chosen.score_breakdown.quality_id);
            repo.record_grab_history(
                item.media_type,
                item.media_id,
                &quality_name,
                item.has_file,
                &outcome.client_name,
                &outcome.download_id,
                target_slot_id,
            )
            .await?;
            info!(item = %item.item_key(), client = %outcome.client_name, "grabbed release");
            Ok(GroupOutcome::Grabbed)
        }
        Err(e) => {
            warn!(item = %item.item_key(), error = %e, "grab failed");
            Err(RadarrError::GrabFailure { media_key: item.item_key(), message: e.to_string() })
        }
    }
}

/// §4.5: single-flight RSS sync cycle over every RSS-enabled indexer
/// (native feeds plus the Prowlarr-aggregated feed when configured).
pub struct RssSyncOrchestrator<R: SyncRepo + 'static, F: FeedSource> {
    repo: Arc<R>,
    service: Arc<DownloaderService<R>>,
    profiles: Arc<dyn QualityProfileStore>,
    event_bus: Arc<EventBus>,
    grab_lock: Arc<crate::grab_lock::GrabLock>,
    fetcher: Arc<RssFetcher<F>>,
    running: AtomicBool,
}

impl<R: SyncRepo + 'static, F: FeedSource> RssSyncOrchestrator<R, F> {
    pub fn new(
        repo: Arc<R>,
        service: Arc<DownloaderService<R>>,
        profiles: Arc<dyn QualityProfileStore>,
        event_bus: Arc<EventBus>,
        grab_lock: Arc<crate::grab_lock::GrabLock>,
        fetcher: Arc<RssFetcher<F>>,
    ) -> Self {
        Self { repo, service, profiles, event_bus, grab_lock, fetcher, running: AtomicBool::new(false) }
    }

    /// Returns `false` without doing anything if a cycle is already in
    /// flight, per §4.5's single-flight requirement.
    pub async fn run_cycle(&self) -> Result<bool> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        let result = self.run_cycle_inner().await;
        self.running.store(false, Ordering::SeqCst);
        if let Err(e) = &result {
            let _ = self.event_bus.publish(SystemEvent::RssSyncFailed { error: e.to_string() }).await;
        }
        result.map(|_| true)
    }

    async fn run_cycle_inner(&self) -> Result<()> {
        let start = std::time::Instant::now();

        // §4.5 step 1: no feeds at all → record empty status and return
        // before touching the wanted set or any cache boundary.
        let feeds = self.fetcher.fetch_native(self.repo.as_ref()).await?;
        if feeds.is_empty() {
            self.event_bus
                .publish(SystemEvent::RssSyncCompleted {
                    total_releases: 0,
                    matched: 0,
                    grabbed: 0,
                    elapsed_ms: start.elapsed().as_millis() as i64,
                })
                .await?;
            return Ok(());
        }
        self.event_bus.publish(SystemEvent::RssSyncStarted { indexer_count: feeds.len() as i32 }).await?;

        // §4.5 step 2: no wanted items → record status and return. This
        // must happen BEFORE the per-feed loop below: that loop advances
        // each indexer's cache boundary past every release it walks, so
        // running it with an empty wanted set would permanently skip
        // releases that a later-added wanted item could have matched.
        let wanted = collect_wanted(self.repo.as_ref(), &crate::wanted::NoBackoff).await?;
        if wanted.is_empty() {
            self.event_bus
                .publish(SystemEvent::RssSyncCompleted {
                    total_releases: 0,
                    matched: 0,
                    grabbed: 0,
                    elapsed_ms: start.elapsed().as_millis() as i64,
                })
                .await?;
            return Ok(());
        }
        let index = WantedIndex::build(&wanted);

        let mut total_releases = 0usize;
        let mut all_matches = Vec::new();

        for feed in &feeds {
            let boundary = self.repo.get_indexer_rss_cache(feed.indexer_id).await?;
            let mut newest: Option<(String, chrono::DateTime<chrono::Utc>)> = None;
            let mut matched_count = 0usize;
            let mut reached_boundary = false;

            for release in &feed.releases {
                if boundary.is_boundary(&release.download_url, release.publish_date) {
                    reached_boundary = true;
                    break;
                }
                total_releases += 1;
                let mut release = release.clone();
                let matches = match_release(self.repo.as_ref(), &index, &mut release).await?;
                matched_count += matches.len();
                all_matches.extend(matches);

                if newest.as_ref().map(|(_, d)| release.publish_date > *d).unwrap_or(true) {
                    newest = Some((release.download_url.clone(), release.publish_date));
                }
            }

            // §4.5 step 4: feed filled maxResultsPerIndexer without ever
            // reaching its boundary — sync frequency should increase.
            if !reached_boundary && feed.releases.len() >= MAX_RESULTS_PER_INDEXER {
                warn!(
                    indexer = %feed.indexer_name,
                    results = feed.releases.len(),
                    "feed filled maxResultsPerIndexer without reaching cache boundary, sync frequency should increase"
                );
            }

            self.event_bus
                .publish(SystemEvent::RssSyncProgress {
                    indexer: feed.indexer_name.clone(),
                    releases_found: feed.releases.len() as i32,
                    matched: matched_count as i32,
                })
                .await?;

            if let Some((url, date)) = newest {
                self.repo
                    .update_indexer_rss_cache(feed.indexer_id, &CacheBoundary { url: Some(url), publish_date: Some(date) })
                    .await?;
            }
        }

        let matched = all_matches.len();
        let summary = score_and_grab(&self.repo, &self.service, self.profiles.as_ref(), &self.event_bus, &self.grab_lock, all_matches)
            .await?;

        self.event_bus
            .publish(SystemEvent::RssSyncCompleted {
                total_releases: total_releases as i32,
                matched: matched as i32,
                grabbed: summary.grabbed as i32,
                elapsed_ms: start.elapsed().as_millis() as i64,
            })
            .await?;

        Ok(())
    }
}
